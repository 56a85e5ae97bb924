//! # unlock-pdf
//!
//! Offline PDF password recovery. Given an encrypted document and a source
//! of candidate passwords, the crate determines whether any candidate
//! unlocks the document and, if so, which one and against which role (user
//! or owner) at which security revision.
//!
//! Three pieces compose the core:
//!
//! - [`crypto`] - byte-exact MD5/SHA-2 digests, a re-keyable RC4 handle and
//!   the AES-CBC directions the PDF derivations need
//! - [`parser`] - an extractor that pulls only the `/Encrypt` dictionary and
//!   trailer `/ID` out of a raw PDF buffer
//! - [`handlers`] + [`cracker`] - the Standard Security Handler family for
//!   revisions 2 through 6 and the parallel dispatcher that feeds them
//!
//! The crate never decrypts document content; it only proves that a
//! password recovers the file encryption key.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use unlock_pdf::{crack, default_handlers, read_pdf_bytes, MemorySource};
//!
//! # fn main() -> unlock_pdf::Result<()> {
//! let pdf = read_pdf_bytes("report.pdf")?;
//! let candidates = MemorySource::new(vec!["111999".into(), "hunter2".into()]);
//! let handlers = default_handlers();
//!
//! let result = crack(&pdf, &candidates, &handlers, 0)?;
//! if result.success {
//!     println!("{} [{}]", result.password, result.variant);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Brute force
//!
//! ```rust,no_run
//! use unlock_pdf::{crack_brute_force, default_handlers, read_pdf_bytes};
//! use unlock_pdf::{AlphabetSpec, BruteForce};
//!
//! # fn main() -> unlock_pdf::Result<()> {
//! let pdf = read_pdf_bytes("report.pdf")?;
//! let alphabet = AlphabetSpec {
//!     include_uppercase: false,
//!     include_special: false,
//!     ..Default::default()
//! }
//! .build()?;
//! let space = BruteForce::new(alphabet, 4, 6)?;
//!
//! let result = crack_brute_force(&pdf, &space, &default_handlers(), 0)?;
//! # Ok(())
//! # }
//! ```

pub mod cracker;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod permissions;

pub use cracker::{
    crack, crack_brute_force, AlphabetSpec, BruteForce, CandidateSource, CrackResult,
    MemorySource, WordlistFile,
};
pub use error::{Result, UnlockError};
pub use handlers::{default_handlers, Resolution, SecurityHandler};
pub use parser::{parse_encrypt_info, read_pdf_bytes, AlgorithmSummary, EncryptInfo};
pub use permissions::Permissions;
