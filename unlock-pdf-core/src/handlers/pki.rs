use super::{Resolution, SecurityHandler};
use crate::parser::EncryptInfo;

/// Certificate-recipient (public-key) protection. Detected and reported;
/// password search does not apply.
pub struct PkiEncryptionHandler;

fn has_pki_sub_filter(sub_filter: &str) -> bool {
    if sub_filter.is_empty() {
        return false;
    }
    let lower = sub_filter.to_ascii_lowercase();
    lower.contains("pkcs7") || lower.contains("pubsec") || lower.contains("x509")
}

impl SecurityHandler for PkiEncryptionHandler {
    fn name(&self) -> &'static str {
        "PKI-based Encryption"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        if !info.encrypted {
            return false;
        }
        if info.filter == "Adobe.PubSec" || info.has_recipients {
            return true;
        }
        has_pki_sub_filter(&info.sub_filter)
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
            variant: "PKI-based Encryption".to_string(),
            password: String::new(),
        })
    }
}
