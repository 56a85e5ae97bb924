use super::standard_security::{check_owner_password, check_user_password};
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Revision 3 documents whose string filter names something other than the
/// plain RC4 method. The common no-crypt-filter R3 case belongs to
/// [`super::Rc4With128BitHandler`].
pub struct StandardRevision3Handler;

impl SecurityHandler for StandardRevision3Handler {
    fn name(&self) -> &'static str {
        "Standard Encryption (Revision 3)"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted
            && is_standard_filter(info)
            && info.revision == 3
            && !info.string_filter.is_empty()
            && info.string_filter != "V2"
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        let key_length_bits = if info.length > 0 { info.length } else { 128 };
        if check_user_password(password.as_bytes(), info, 3, key_length_bits) {
            return Some("Standard Encryption (Revision 3) Password-Based Encryption".to_string());
        }
        if check_owner_password(password.as_bytes(), info, 3, key_length_bits) {
            return Some("Standard Encryption (Revision 3) Owner Password".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_only_with_non_v2_string_filter() {
        let handler = StandardRevision3Handler;
        let mut info = EncryptInfo {
            encrypted: true,
            filter: "Standard".to_string(),
            revision: 3,
            string_filter: "StdCF".to_string(),
            ..Default::default()
        };
        assert!(handler.applies(&info));

        info.string_filter = "V2".to_string();
        assert!(!handler.applies(&info));

        info.string_filter.clear();
        assert!(!handler.applies(&info));
    }
}
