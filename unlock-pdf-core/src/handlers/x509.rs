use super::{Resolution, SecurityHandler};
use crate::parser::EncryptInfo;

/// X.509 signature-based protection. Detected and reported; there is no
/// password to recover.
pub struct X509SignatureHandler;

impl SecurityHandler for X509SignatureHandler {
    fn name(&self) -> &'static str {
        "X.509 Digital Signatures"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        if !info.encrypted {
            return false;
        }
        info.filter.to_ascii_lowercase().contains("x509")
            || info.sub_filter.to_ascii_lowercase().contains("x509")
    }

    fn requires_password(&self) -> bool {
        false
    }

    fn check(&self, _password: &str, _info: &EncryptInfo) -> Option<String> {
        None
    }

    fn resolve_without_password(&self, _info: &EncryptInfo) -> Option<Resolution> {
        Some(Resolution {
            success: false,
            variant: "X.509 Digital Signatures".to_string(),
            password: String::new(),
        })
    }
}
