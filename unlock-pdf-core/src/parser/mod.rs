//! Encryption-dictionary extraction from raw PDF bytes.
//!
//! This is not a PDF parser. It locates the trailer's `/Encrypt` reference,
//! resolves it within the same buffer and decodes the handful of keys the
//! security handlers need, tolerating hostile input along the way.

mod encrypt_dict;
mod lexer;

pub use encrypt_dict::{parse_encrypt_info, AlgorithmSummary, EncryptInfo};

use std::io::Read as _;
use std::path::Path;

use crate::error::{Result, UnlockError};

/// Read a PDF fully into memory. The file handle is closed before any
/// search work begins.
pub fn read_pdf_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|source| UnlockError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| UnlockError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}
