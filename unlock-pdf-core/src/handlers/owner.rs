use super::standard_security::check_owner_password;
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Owner-only fallback: tries just the owner derivation across revisions 2
/// through 4. Last in the registry so role-specific labels win first.
pub struct OwnerPasswordHandler;

impl SecurityHandler for OwnerPasswordHandler {
    fn name(&self) -> &'static str {
        "Owner Password"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted && is_standard_filter(info) && (2..=4).contains(&info.revision)
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        for revision in [2, 3, 4] {
            if info.revision != 0 && info.revision != revision {
                continue;
            }
            let default_bits = if revision == 2 { 40 } else { 128 };
            let key_length_bits = if info.length > 0 { info.length } else { default_bits };

            if check_owner_password(password.as_bytes(), info, revision, key_length_bits) {
                return Some(format!("Owner Password (Revision {revision})"));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::standard_security::{compute_owner_entry, compute_user_entry};

    #[test]
    fn test_matches_owner_only() {
        let owner_entry = compute_owner_entry(b"chief", b"staff", 4, 128);
        let user_entry = compute_user_entry(b"staff", &owner_entry, -4, b"id", 4, 128, true);
        let info = EncryptInfo {
            encrypted: true,
            revision: 4,
            length: 128,
            permissions: -4,
            id: b"id".to_vec(),
            o_string: owner_entry,
            u_string: user_entry,
            ..Default::default()
        };

        let handler = OwnerPasswordHandler;
        assert!(handler.applies(&info));
        assert_eq!(
            handler.check("chief", &info).unwrap(),
            "Owner Password (Revision 4)"
        );
        // the user password is not this handler's concern
        assert!(handler.check("staff", &info).is_none());
    }

    #[test]
    fn test_does_not_apply_outside_2_to_4() {
        let handler = OwnerPasswordHandler;
        for revision in [0, 1, 5, 6] {
            let info = EncryptInfo {
                encrypted: true,
                revision,
                ..Default::default()
            };
            assert!(!handler.applies(&info), "revision {revision}");
        }
    }
}
