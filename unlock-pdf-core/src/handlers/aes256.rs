//! AES-256 handler for revisions 5 and 6 (ISO 32000-2 section 7.6.4).

use super::{is_standard_filter, SecurityHandler};
use crate::crypto::{aes128_cbc_encrypt, aes256_cbc_decrypt, sha256, sha2_hash};
use crate::parser::EncryptInfo;

const USER_VARIANT: &str = "AES-256 (Revision 5/6) Password-Based Encryption";
const OWNER_VARIANT: &str = "AES-256 (Revision 5/6) Owner Password";

/// Password handler for AES-256 documents.
///
/// For documents that claim revision 6 the plain revision 5 derivation is
/// also tested against the stored hashes; some producers write R6
/// dictionaries with R5 hashes. The fallback can be disabled with
/// [`Aes256Handler::without_r5_fallback`].
pub struct Aes256Handler {
    r5_fallback: bool,
}

impl Aes256Handler {
    pub fn new() -> Self {
        Self { r5_fallback: true }
    }

    /// Strict mode: test only the derivation the dictionary's revision names.
    pub fn without_r5_fallback() -> Self {
        Self { r5_fallback: false }
    }
}

impl Default for Aes256Handler {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash algorithm 2.B: SHA-256 of password, salt and user data, refined for
/// revision 6 by the iterative AES-128-CBC / SHA-2 loop.
///
/// Returns `None` when the derivation cannot be run; callers treat that as a
/// failed candidate.
pub fn compute_hash_v5(
    password: &[u8],
    salt: &[u8],
    extra: &[u8],
    revision: i32,
) -> Option<Vec<u8>> {
    let mut input = Vec::with_capacity(password.len() + salt.len() + extra.len());
    input.extend_from_slice(password);
    input.extend_from_slice(salt);
    input.extend_from_slice(extra);

    let mut k = sha256(&input).to_vec();
    if revision < 6 {
        return Some(k);
    }

    let mut k1 = Vec::with_capacity(64 * (password.len() + 64 + extra.len()));
    let mut round: u32 = 0;
    loop {
        round += 1;

        // K1 is 64 repetitions of password || K || extra, which keeps the
        // length a multiple of 16 without padding.
        k1.clear();
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(extra);
        }

        let encrypted = aes128_cbc_encrypt(&k[..16], &k[16..32], &k1).ok()?;

        // the first 16 bytes, taken mod 3, select the next digest width
        let sum: u32 = encrypted[..16].iter().map(|&b| u32::from(b)).sum();
        k = match sum % 3 {
            0 => sha2_hash(&encrypted, 256),
            1 => sha2_hash(&encrypted, 384),
            _ => sha2_hash(&encrypted, 512),
        };

        if round >= 64 {
            let last = *encrypted.last()?;
            if u32::from(last) <= round - 32 {
                break;
            }
        }
    }

    k.truncate(32);
    Some(k)
}

fn truncated(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(127)]
}

fn try_user_password(password: &[u8], info: &EncryptInfo, revision: i32) -> bool {
    if info.u_string.len() < 48 || info.ue_string.len() < 32 {
        return false;
    }

    let validation_salt = &info.u_string[32..40];
    let key_salt = &info.u_string[40..48];

    let Some(hash) = compute_hash_v5(password, validation_salt, &[], revision) else {
        return false;
    };
    if hash.len() < 32 || hash[..32] != info.u_string[..32] {
        return false;
    }

    let Some(key) = compute_hash_v5(password, key_salt, &[], revision) else {
        return false;
    };

    // structural guard: the file key envelope must decrypt to 32 bytes
    matches!(
        aes256_cbc_decrypt(&key[..32], &[0u8; 16], &info.ue_string, false),
        Ok(file_key) if file_key.len() >= 32
    )
}

fn try_owner_password(password: &[u8], info: &EncryptInfo, revision: i32) -> bool {
    if info.o_string.len() < 48 || info.oe_string.len() < 32 || info.u_string.len() < 48 {
        return false;
    }

    let validation_salt = &info.o_string[32..40];
    let key_salt = &info.o_string[40..48];
    let user_entry = &info.u_string[..48];

    let Some(hash) = compute_hash_v5(password, validation_salt, user_entry, revision) else {
        return false;
    };
    if hash.len() < 32 || hash[..32] != info.o_string[..32] {
        return false;
    }

    let Some(key) = compute_hash_v5(password, key_salt, user_entry, revision) else {
        return false;
    };

    matches!(
        aes256_cbc_decrypt(&key[..32], &[0u8; 16], &info.oe_string, false),
        Ok(file_key) if file_key.len() >= 32
    )
}

impl SecurityHandler for Aes256Handler {
    fn name(&self) -> &'static str {
        "AES-256 (Revision 5/6)"
    }

    fn applies(&self, info: &EncryptInfo) -> bool {
        info.encrypted && is_standard_filter(info) && info.revision >= 5
    }

    fn check(&self, password: &str, info: &EncryptInfo) -> Option<String> {
        let password = truncated(password);

        if info.revision >= 6 {
            if try_user_password(password, info, 6) {
                return Some(USER_VARIANT.to_string());
            }
            if try_owner_password(password, info, 6) {
                return Some(OWNER_VARIANT.to_string());
            }
            if !self.r5_fallback {
                return None;
            }
        }

        if try_user_password(password, info, 5) {
            return Some(USER_VARIANT.to_string());
        }
        if try_owner_password(password, info, 5) {
            return Some(OWNER_VARIANT.to_string());
        }
        None
    }
}
