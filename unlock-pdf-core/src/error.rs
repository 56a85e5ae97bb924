use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnlockError {
    #[error("Not a PDF file (missing %PDF- header)")]
    NotAPdf,

    #[error("Malformed encryption dictionary: {0}")]
    MalformedEncryptDictionary(String),

    #[error("Unsupported protection: no handler accepts this document")]
    UnsupportedProtection,

    #[error("Candidate source is empty")]
    EmptyCandidateSource,

    #[error("Invalid brute-force length range: {min}..={max}")]
    InvalidBruteForceRange { min: usize, max: usize },

    #[error("Cannot open {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Encoding error in {} at byte {offset}", .path.display())]
    EncodingError { path: PathBuf, offset: u64 },

    #[error("Crypto shape violation: {0}")]
    CryptoShape(String),
}

pub type Result<T> = std::result::Result<T, UnlockError>;
