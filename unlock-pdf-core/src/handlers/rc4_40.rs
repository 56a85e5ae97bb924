use super::standard_security::{check_owner_password, check_user_password};
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Revision 2 (and earlier) documents: 40-bit RC4.
pub struct Rc4With40BitHandler;

impl SecurityHandler for Rc4With40BitHandler {
    fn name(&self) -> &'static str {
        "RC4 (40-bit)"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted && is_standard_filter(info) && info.revision <= 2
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        let key_length_bits = if info.length > 0 { info.length } else { 40 };
        if check_user_password(password.as_bytes(), info, 2, key_length_bits) {
            return Some("RC4 (40-bit) Password-Based Encryption".to_string());
        }
        if check_owner_password(password.as_bytes(), info, 2, key_length_bits) {
            return Some("RC4 (40-bit) Owner Password".to_string());
        }
        None
    }
}
