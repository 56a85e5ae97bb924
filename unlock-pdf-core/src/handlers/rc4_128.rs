use super::standard_security::{check_owner_password, check_user_password};
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Revision 3 documents using plain RC4 (no string filter, or `/StrF /V2`).
pub struct Rc4With128BitHandler;

impl SecurityHandler for Rc4With128BitHandler {
    fn name(&self) -> &'static str {
        "RC4 (128-bit)"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        if !info.encrypted || !is_standard_filter(info) || info.revision != 3 {
            return false;
        }
        if !info.string_filter.is_empty() && info.string_filter != "V2" {
            return false;
        }
        let key_length_bits = if info.length > 0 { info.length } else { 128 };
        key_length_bits >= 40
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        let key_length_bits = if info.length > 0 { info.length } else { 128 };
        if check_user_password(password.as_bytes(), info, 3, key_length_bits) {
            return Some("RC4 (128-bit) Password-Based Encryption".to_string());
        }
        if check_owner_password(password.as_bytes(), info, 3, key_length_bits) {
            return Some("RC4 (128-bit) Owner Password".to_string());
        }
        None
    }
}
