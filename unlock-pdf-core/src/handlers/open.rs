use super::{Resolution, SecurityHandler};
use crate::parser::EncryptInfo;

/// Documents without an `/Encrypt` entry need no password at all.
pub struct OpenProtectionHandler;

impl SecurityHandler for OpenProtectionHandler {
    fn name(&self) -> &'static str {
        "Open Password Protection"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        !info.encrypted
    }

    fn requires_password(&self) -> bool {
        false
    }

    fn check(&self, _password: &str, _info: &EncryptInfo) -> Option<String> {
        None
    }

    fn resolve_without_password(&self, _info: &EncryptInfo) -> Option<Resolution> {
        Some(Resolution {
            success: true,
            variant: "Open Password Protection (No encryption)".to_string(),
            password: String::new(),
        })
    }
}
