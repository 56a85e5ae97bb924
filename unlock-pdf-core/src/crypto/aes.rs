//! AES-CBC block operations.
//!
//! The revision 6 hash loop encrypts with AES-128-CBC and the revision 5/6
//! handlers decrypt the `/UE`/`/OE` file-key envelopes with AES-256-CBC.
//! Neither direction pads: the hash loop input is a multiple of 16 bytes by
//! construction and the key envelopes are exactly two blocks. PKCS#7 stripping
//! is offered for callers that decrypt padded material.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};

use crate::error::{Result, UnlockError};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const BLOCK_SIZE: usize = 16;

/// Encrypt `plaintext` with AES-128 in CBC mode.
///
/// No padding is added; the input must already be a non-empty multiple of the
/// block size.
pub fn aes128_cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 16 {
        return Err(UnlockError::CryptoShape(format!(
            "AES-128 key must be 16 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    check_block_aligned(plaintext)?;

    let mut encryptor = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| UnlockError::CryptoShape(e.to_string()))?;

    let mut buffer = plaintext.to_vec();
    for block in buffer.chunks_exact_mut(BLOCK_SIZE) {
        encryptor.encrypt_block_mut(block.into());
    }
    Ok(buffer)
}

/// Decrypt `ciphertext` with AES-256 in CBC mode.
///
/// When `strip_padding` is set the plaintext must end in valid PKCS#7
/// padding, which is removed; otherwise all blocks are returned as-is.
pub fn aes256_cbc_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    strip_padding: bool,
) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(UnlockError::CryptoShape(format!(
            "AES-256 key must be 32 bytes, got {}",
            key.len()
        )));
    }
    check_iv(iv)?;
    check_block_aligned(ciphertext)?;

    let mut decryptor = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| UnlockError::CryptoShape(e.to_string()))?;

    let mut buffer = ciphertext.to_vec();
    for block in buffer.chunks_exact_mut(BLOCK_SIZE) {
        decryptor.decrypt_block_mut(block.into());
    }

    if strip_padding {
        strip_pkcs7(&mut buffer)?;
    }
    Ok(buffer)
}

fn check_iv(iv: &[u8]) -> Result<()> {
    if iv.len() != BLOCK_SIZE {
        return Err(UnlockError::CryptoShape(format!(
            "IV must be 16 bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

fn check_block_aligned(data: &[u8]) -> Result<()> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(UnlockError::CryptoShape(format!(
            "data length {} is not a non-empty multiple of 16",
            data.len()
        )));
    }
    Ok(())
}

fn strip_pkcs7(buffer: &mut Vec<u8>) -> Result<()> {
    let padding = usize::from(*buffer.last().unwrap_or(&0));
    if padding == 0 || padding > BLOCK_SIZE || padding > buffer.len() {
        return Err(UnlockError::CryptoShape(format!(
            "invalid PKCS#7 padding length {padding}"
        )));
    }
    let start = buffer.len() - padding;
    if buffer[start..].iter().any(|&b| b as usize != padding) {
        return Err(UnlockError::CryptoShape(
            "inconsistent PKCS#7 padding bytes".to_string(),
        ));
    }
    buffer.truncate(start);
    Ok(())
}
