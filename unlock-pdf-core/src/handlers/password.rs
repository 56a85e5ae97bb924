use super::standard_security::{check_owner_password, check_user_password};
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Generic fallback: walks revisions 2 through 4 with default key lengths.
/// Catches dictionaries whose revision field is missing or whose specific
/// handler declined on a technicality.
pub struct PasswordFallbackHandler;

impl SecurityHandler for PasswordFallbackHandler {
    fn name(&self) -> &'static str {
        "Password-Based Encryption"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted && is_standard_filter(info) && info.revision <= 4
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        for revision in [2, 3, 4] {
            if info.revision != 0 && info.revision != revision {
                continue;
            }
            let default_bits = if revision == 2 { 40 } else { 128 };
            let key_length_bits = if info.length > 0 { info.length } else { default_bits };

            if check_user_password(password.as_bytes(), info, revision, key_length_bits) {
                return Some(format!("Password-Based Encryption (Revision {revision})"));
            }
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
    fn test_matches_document_with_missing_revision() {
        // the dictionary carried no /R; the fallback probes each revision
        let owner_entry = compute_owner_entry(b"o", b"pass", 3, 128);
        let user_entry = compute_user_entry(b"pass", &owner_entry, -1, b"id", 3, 128, true);
        let info = EncryptInfo {
            encrypted: true,
            revision: 0,
            length: 128,
            permissions: -1,
            id: b"id".to_vec(),
            o_string: owner_entry,
            u_string: user_entry,
            ..Default::default()
        };

        let handler = PasswordFallbackHandler;
        assert!(handler.applies(&info));
        assert_eq!(
            handler.check("pass", &info).unwrap(),
            "Password-Based Encryption (Revision 3)"
        );
    }

    #[test]
    fn test_respects_known_revision() {
        let owner_entry = compute_owner_entry(b"o", b"u", 2, 40);
        let user_entry = compute_user_entry(b"u", &owner_entry, -1, b"id", 2, 40, true);
        let info = EncryptInfo {
            encrypted: true,
            revision: 2,
            length: 40,
            permissions: -1,
            id: b"id".to_vec(),
            o_string: owner_entry,
            u_string: user_entry,
            ..Default::default()
        };

        let handler = PasswordFallbackHandler;
        assert_eq!(
            handler.check("u", &info).unwrap(),
            "Password-Based Encryption (Revision 2)"
        );
    }

    #[test]
    fn test_does_not_apply_to_aes256() {
        let handler = PasswordFallbackHandler;
        let info = EncryptInfo {
            encrypted: true,
            revision: 6,
            ..Default::default()
        };
        assert!(!handler.applies(&info));
    }
}
