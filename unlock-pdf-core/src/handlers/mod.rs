//! Security handler registry.
//!
//! Each handler answers three questions about a parsed [`EncryptInfo`]: does
//! it apply, does a given password work (and in which role), and can it
//! resolve the document without any password at all. The dispatcher walks the
//! registry in a fixed order; the non-password handlers come first so
//! unencrypted and certificate-protected documents short-circuit the search.

mod aes128;
mod aes256;
mod open;
mod owner;
mod password;
mod pki;
mod rc4_128;
mod rc4_40;
mod standard_r3;
pub mod standard_security;
mod x509;

pub use aes128::Aes128Handler;
pub use aes256::{compute_hash_v5, Aes256Handler};
pub use open::OpenProtectionHandler;
pub use owner::OwnerPasswordHandler;
pub use password::PasswordFallbackHandler;
pub use pki::PkiEncryptionHandler;
pub use rc4_128::Rc4With128BitHandler;
pub use rc4_40::Rc4With40BitHandler;
pub use standard_r3::StandardRevision3Handler;
pub use x509::X509SignatureHandler;

use crate::parser::EncryptInfo;

/// Outcome of a handler that resolves a document without a password.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Whether the document is accessible
    pub success: bool,
    /// Handler label describing the protection
    pub variant: String,
    /// Recovered password, empty when none is needed
    pub password: String,
}

/// A security handler: a pure, thread-safe password test for one protection
/// family.
pub trait SecurityHandler: Send + Sync {
    /// Human label for this handler.
    fn name(&self) -> &'static str;

    /// Whether this handler applies to the document.
    fn applies(&self, info: &EncryptInfo) -> bool;

    /// Whether a candidate search makes sense for this handler.
    fn requires_password(&self) -> bool {
        true
    }

    /// Test a password; returns the matched variant label on success.
    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String>;

    /// Resolve without a password, for handlers representing unencrypted or
    /// non-password-protected documents.
    fn resolve_without_password(&self, _info: &EncryptInfo) -> Option<Resolution> {
        None
    }
}

/// True when the document's security handler is the standard one (or is
/// unnamed, which real-world encoders sometimes leave out).
pub(crate) fn is_standard_filter(info: &EncryptInfo) -> bool {
    info.filter.is_empty() || info.filter == "Standard"
}

/// The fixed handler registry, in resolution order.
pub fn default_handlers() -> Vec<Box<dyn SecurityHandler>> {
    vec![
        Box::new(OpenProtectionHandler),
        Box::new(PkiEncryptionHandler),
        Box::new(X509SignatureHandler),
        Box::new(Aes256Handler::new()),
        Box::new(Aes128Handler),
        Box::new(StandardRevision3Handler),
        Box::new(Rc4With128BitHandler),
        Box::new(Rc4With40BitHandler),
        Box::new(PasswordFallbackHandler),
        Box::new(OwnerPasswordHandler),
    ]
}
