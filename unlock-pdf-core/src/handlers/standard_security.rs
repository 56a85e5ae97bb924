//! Standard Security Handler derivations for revisions 2-4 (ISO 32000-1
//! section 7.6.3).
//!
//! The checks work on raw password bytes rather than `&str`: the owner check
//! recovers the user password from the `/O` entry, and those bytes carry no
//! encoding guarantee.

use crate::crypto::{md5, Rc4};
use crate::parser::EncryptInfo;

/// Padding used in password processing (ISO 32000-1 Algorithm 2)
pub(crate) const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    if len < 32 {
        padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    }
    padded
}

/// Strip the padding suffix, recovering the password prefix.
///
/// Scans for the earliest offset where the remainder of the buffer matches
/// the start of the padding string.
pub(crate) fn unpad_password(padded: &[u8]) -> Vec<u8> {
    let max = padded.len().min(32);
    for n in 0..=max {
        if padded[n..max]
            .iter()
            .zip(PASSWORD_PADDING.iter())
            .all(|(byte, pad)| byte == pad)
        {
            return padded[..n].to_vec();
        }
    }
    padded[..max].to_vec()
}

/// Derive the file encryption key from a user password (Algorithm 2).
///
/// Returns `None` on nonsensical key sizes; callers treat that as a failed
/// candidate.
pub fn compute_encryption_key(
    password: &[u8],
    info: &EncryptInfo,
    revision: i32,
    key_length_bits: i32,
) -> Option<Vec<u8>> {
    if key_length_bits <= 0 || key_length_bits % 8 != 0 {
        return None;
    }
    let key_length_bytes = (key_length_bits / 8) as usize;

    let mut data = pad_password(password).to_vec();
    data.extend_from_slice(&info.o_string);
    data.extend_from_slice(&(info.permissions as u32).to_le_bytes());
    data.extend_from_slice(&info.id);
    if revision >= 4 && !info.encrypt_metadata {
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    let mut hash = md5(&data).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            let take = key_length_bytes.min(hash.len());
            hash = md5(&hash[..take]).to_vec();
        }
    }

    if hash.len() < key_length_bytes {
        return None;
    }
    hash.truncate(key_length_bytes);
    Some(hash)
}

/// Validate a user password against the `/U` entry (Algorithms 4, 5 and 6).
pub(crate) fn check_user_password(
    password: &[u8],
    info: &EncryptInfo,
    revision: i32,
    key_length_bits: i32,
) -> bool {
    if info.u_string.is_empty() {
        return false;
    }
    let Some(key) = compute_encryption_key(password, info, revision, key_length_bits) else {
        return false;
    };

    let mut rc4 = Rc4::new(&key);

    if revision <= 2 {
        let buffer = rc4.process(&PASSWORD_PADDING);
        return info.u_string.len() >= 32 && buffer[..] == info.u_string[..32];
    }

    let mut seed_input = PASSWORD_PADDING.to_vec();
    seed_input.extend_from_slice(&info.id);
    let mut buffer = md5(&seed_input).to_vec();

    rc4.reset_key(&key);
    rc4.process_in_place(&mut buffer);
    for i in 1..=19u8 {
        let iteration_key: Vec<u8> = key.iter().map(|byte| byte ^ i).collect();
        rc4.reset_key(&iteration_key);
        rc4.process_in_place(&mut buffer);
    }

    info.u_string.len() >= 16 && buffer[..16] == info.u_string[..16]
}

/// Validate an owner password against the `/O` entry (Algorithm 7).
///
/// Decrypts `/O` back into the padded user password, strips the padding and
/// re-runs the user check. When stripping produces an empty password from a
/// non-empty buffer, the full 32 bytes are tried as the user password; some
/// producers pad the user password out to the full width.
pub(crate) fn check_owner_password(
    password: &[u8],
    info: &EncryptInfo,
    revision: i32,
    key_length_bits: i32,
) -> bool {
    if info.o_string.is_empty() || key_length_bits <= 0 || key_length_bits % 8 != 0 {
        return false;
    }
    let key_length_bytes = (key_length_bits / 8) as usize;

    let mut digest = md5(&pad_password(password)).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            digest = md5(&digest).to_vec();
        }
    }
    if digest.len() < key_length_bytes {
        return false;
    }
    digest.truncate(key_length_bytes);

    let mut data = info.o_string.clone();
    let mut rc4 = Rc4::new(&digest);
    rc4.process_in_place(&mut data);

    if revision >= 3 {
        for i in (1..=19u8).rev() {
            let iteration_key: Vec<u8> = digest.iter().map(|byte| byte ^ i).collect();
            rc4.reset_key(&iteration_key);
            rc4.process_in_place(&mut data);
        }
    }

    let mut user_password = unpad_password(&data);
    if user_password.is_empty() && !data.is_empty() {
        user_password = data.clone();
    }
    check_user_password(&user_password, info, revision, key_length_bits)
}

/// Build the `/O` entry from an owner and user password (Algorithm 3).
///
/// This is the forward construction; the cracker only ever inverts it, but
/// the fixtures for the inversion tests are produced with it.
pub fn compute_owner_entry(
    owner_password: &[u8],
    user_password: &[u8],
    revision: i32,
    key_length_bits: i32,
) -> Vec<u8> {
    let key_length_bytes = ((key_length_bits.max(8)) / 8) as usize;

    let mut digest = md5(&pad_password(owner_password)).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            digest = md5(&digest).to_vec();
        }
    }
    digest.truncate(key_length_bytes);

    let mut result = pad_password(user_password).to_vec();
    let mut rc4 = Rc4::new(&digest);
    rc4.process_in_place(&mut result);

    if revision >= 3 {
        for i in 1..=19u8 {
            let iteration_key: Vec<u8> = digest.iter().map(|byte| byte ^ i).collect();
            rc4.reset_key(&iteration_key);
            rc4.process_in_place(&mut result);
        }
    }

    result
}

/// Build the `/U` entry from a user password (Algorithms 4 and 5).
pub fn compute_user_entry(
    user_password: &[u8],
    owner_entry: &[u8],
    permissions: i32,
    id: &[u8],
    revision: i32,
    key_length_bits: i32,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let info = EncryptInfo {
        o_string: owner_entry.to_vec(),
        permissions,
        id: id.to_vec(),
        encrypt_metadata,
        ..Default::default()
    };
    let Some(key) = compute_encryption_key(user_password, &info, revision, key_length_bits) else {
        return Vec::new();
    };

    let mut rc4 = Rc4::new(&key);

    if revision <= 2 {
        return rc4.process(&PASSWORD_PADDING);
    }

    let mut seed_input = PASSWORD_PADDING.to_vec();
    seed_input.extend_from_slice(id);
    let mut result = md5(&seed_input).to_vec();

    rc4.reset_key(&key);
    rc4.process_in_place(&mut result);
    for i in 1..=19u8 {
        let iteration_key: Vec<u8> = key.iter().map(|byte| byte ^ i).collect();
        rc4.reset_key(&iteration_key);
        rc4.process_in_place(&mut result);
    }

    // 16 bytes of scrambled hash plus 16 bytes of arbitrary fill
    result.resize(32, 0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_for(
        owner_entry: Vec<u8>,
        user_entry: Vec<u8>,
        permissions: i32,
        id: Vec<u8>,
    ) -> EncryptInfo {
        EncryptInfo {
            o_string: owner_entry,
            u_string: user_entry,
            permissions,
            id,
            encrypted: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_pad_password() {
        let padded = pad_password(b"test");
        assert_eq!(&padded[..4], b"test");
        assert_eq!(&padded[4..], &PASSWORD_PADDING[..28]);

        let long = [b'x'; 40];
        assert_eq!(pad_password(&long)[..], long[..32]);

        assert_eq!(pad_password(b""), PASSWORD_PADDING);
    }

    #[test]
    fn test_unpad_inverts_pad() {
        for password in [&b""[..], b"a", b"open123", b"exactly 32 bytes long password!!"] {
            let recovered = unpad_password(&pad_password(password));
            assert_eq!(recovered, &password[..password.len().min(32)]);
        }
    }

    #[test]
    fn test_unpad_without_padding_suffix() {
        // 32 bytes with no padding suffix come back whole
        let raw = [0x41u8; 32];
        assert_eq!(unpad_password(&raw), raw.to_vec());
    }

    #[test]
    fn test_key_length_shapes() {
        let info = info_for(vec![0u8; 32], vec![0u8; 32], -1, Vec::new());
        assert!(compute_encryption_key(b"x", &info, 3, 0).is_none());
        assert!(compute_encryption_key(b"x", &info, 3, 12).is_none());
        assert_eq!(
            compute_encryption_key(b"x", &info, 2, 40).unwrap().len(),
            5
        );
        assert_eq!(
            compute_encryption_key(b"x", &info, 3, 128).unwrap().len(),
            16
        );
    }

    #[test]
    fn test_user_check_r2_roundtrip() {
        let owner_entry = compute_owner_entry(b"owner", b"user", 2, 40);
        let user_entry = compute_user_entry(b"user", &owner_entry, -1, b"fileid01", 2, 40, true);
        let info = info_for(owner_entry, user_entry, -1, b"fileid01".to_vec());

        assert!(check_user_password(b"user", &info, 2, 40));
        assert!(!check_user_password(b"wrong", &info, 2, 40));
        assert!(!check_user_password(b"", &info, 2, 40));
    }

    #[test]
    fn test_user_check_r3_roundtrip() {
        let owner_entry = compute_owner_entry(b"own3r", b"open123", 3, 128);
        let user_entry =
            compute_user_entry(b"open123", &owner_entry, -3904, b"idbytes", 3, 128, true);
        let info = info_for(owner_entry, user_entry, -3904, b"idbytes".to_vec());

        assert!(check_user_password(b"open123", &info, 3, 128));
        assert!(!check_user_password(b"open124", &info, 3, 128));
    }

    #[test]
    fn test_user_check_r4_metadata_flag_changes_key() {
        let owner_entry = compute_owner_entry(b"o", b"u", 4, 128);
        let user_entry = compute_user_entry(b"u", &owner_entry, -4, b"id", 4, 128, false);

        let mut info = info_for(owner_entry, user_entry, -4, b"id".to_vec());
        info.encrypt_metadata = false;
        assert!(check_user_password(b"u", &info, 4, 128));

        // with the flag flipped the derivation no longer matches
        info.encrypt_metadata = true;
        assert!(!check_user_password(b"u", &info, 4, 128));
    }

    #[test]
    fn test_owner_check_recovers_user_password() {
        let owner_entry = compute_owner_entry(b"secret-owner", b"user-pw", 3, 128);
        let user_entry = compute_user_entry(b"user-pw", &owner_entry, -1, b"docid", 3, 128, true);
        let info = info_for(owner_entry, user_entry, -1, b"docid".to_vec());

        assert!(check_owner_password(b"secret-owner", &info, 3, 128));
        assert!(!check_owner_password(b"user-pw", &info, 3, 128));
        assert!(!check_owner_password(b"nope", &info, 3, 128));
    }

    #[test]
    fn test_owner_check_r2() {
        let owner_entry = compute_owner_entry(b"admin", b"", 2, 40);
        let user_entry = compute_user_entry(b"", &owner_entry, -1, b"id", 2, 40, true);
        let info = info_for(owner_entry, user_entry, -1, b"id".to_vec());

        assert!(check_owner_password(b"admin", &info, 2, 40));
        assert!(check_user_password(b"", &info, 2, 40));
    }

    #[test]
    fn test_owner_check_full_width_user_password() {
        // a 32-byte user password leaves no padding suffix to strip
        let user = b"0123456789abcdef0123456789abcdef";
        let owner_entry = compute_owner_entry(b"boss", user, 3, 128);
        let user_entry = compute_user_entry(user, &owner_entry, -1, b"id", 3, 128, true);
        let info = info_for(owner_entry, user_entry, -1, b"id".to_vec());

        assert!(check_owner_password(b"boss", &info, 3, 128));
    }

    #[test]
    fn test_checks_fail_on_truncated_entries() {
        let owner_entry = compute_owner_entry(b"o", b"u", 3, 128);
        let user_entry = compute_user_entry(b"u", &owner_entry, -1, b"id", 3, 128, true);

        let mut info = info_for(owner_entry, user_entry, -1, b"id".to_vec());
        info.u_string.truncate(8);
        assert!(!check_user_password(b"u", &info, 3, 128));

        info.u_string.clear();
        assert!(!check_user_password(b"u", &info, 3, 128));
        info.o_string.clear();
        assert!(!check_owner_password(b"o", &info, 3, 128));
    }

    #[test]
    fn test_file_key_matches_between_forward_and_check() {
        // if the user check passes, the derived key equals the key used to
        // build the document
        let owner_entry = compute_owner_entry(b"o", b"u", 3, 128);
        let user_entry = compute_user_entry(b"u", &owner_entry, -44, b"xyz", 3, 128, true);
        let info = info_for(owner_entry.clone(), user_entry, -44, b"xyz".to_vec());

        assert!(check_user_password(b"u", &info, 3, 128));

        let from_check = compute_encryption_key(b"u", &info, 3, 128).unwrap();
        let forward_info = EncryptInfo {
            o_string: owner_entry,
            permissions: -44,
            id: b"xyz".to_vec(),
            encrypt_metadata: true,
            ..Default::default()
        };
        let from_forward = compute_encryption_key(b"u", &forward_info, 3, 128).unwrap();
        assert_eq!(from_check, from_forward);
    }
}
