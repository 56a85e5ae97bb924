//! Digest wrappers used by the security handler key derivations.
//!
//! MD5 drives the revision 2-4 derivations; SHA-256/384/512 drive the
//! revision 5/6 derivations, where the digest width is selected per round.

use md5::{Digest as _, Md5};
use sha2::{Sha256, Sha384, Sha512};

/// MD5 digest of `data`.
pub fn md5(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(data));
    out
}

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// SHA-384 digest of `data`.
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut out = [0u8; 48];
    out.copy_from_slice(&Sha384::digest(data));
    out
}

/// SHA-512 digest of `data`.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// SHA-2 digest with the width picked at runtime.
///
/// `bits` must be 256, 384 or 512; the revision 6 hash loop selects it from
/// the round ciphertext.
pub(crate) fn sha2_hash(data: &[u8], bits: usize) -> Vec<u8> {
    match bits {
        256 => sha256(data).to_vec(),
        384 => sha384(data).to_vec(),
        512 => sha512(data).to_vec(),
        _ => unreachable!("SHA-2 width must be 256, 384 or 512"),
    }
}
