use super::standard_security::{check_owner_password, check_user_password};
use super::{is_standard_filter, SecurityHandler};
use crate::parser::EncryptInfo;

/// Revision 4 documents (AES-128 or RC4-128 behind a crypt filter).
pub struct Aes128Handler;

impl SecurityHandler for Aes128Handler {
    fn name(&self) -> &'static str {
        "AES-128 (Revision 4)"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted && is_standard_filter(info) && info.revision == 4
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        let key_length_bits = if info.length > 0 { info.length } else { 128 };
        if check_user_password(password.as_bytes(), info, 4, key_length_bits) {
            return Some("AES-128 (Revision 4) Password-Based Encryption".to_string());
        }
        if check_owner_password(password.as_bytes(), info, 4, key_length_bits) {
            return Some("AES-128 (Revision 4) Owner Password".to_string());
        }
        None
    }
}
