//! Fixture documents for the end-to-end tests.
//!
//! The builders run the forward entry constructions (the inverse of what the
//! cracker does) and wrap the results in a minimal but well-formed PDF
//! buffer: header, encryption object, trailer with `/Encrypt` and `/ID`.

use aes::cipher::{BlockEncryptMut as _, KeyIvInit as _};
use unlock_pdf::handlers::compute_hash_v5;
use unlock_pdf::handlers::standard_security::{compute_owner_entry, compute_user_entry};

pub const FILE_ID: &[u8] = b"\x12\x34\x56\x78\x9A\xBC\xDE\xF0";

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn wrap_pdf(encrypt_dict: &str) -> Vec<u8> {
    let mut pdf = b"%PDF-1.7\n".to_vec();
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    pdf.extend_from_slice(b"5 0 obj\n");
    pdf.extend_from_slice(encrypt_dict.as_bytes());
    pdf.extend_from_slice(b"\nendobj\n");
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size 6 /Root 1 0 R /Encrypt 5 0 R /ID [<{id}> <{id}>] >>\n",
            id = hex(FILE_ID)
        )
        .as_bytes(),
    );
    pdf.extend_from_slice(b"startxref\n0\n%%EOF\n");
    pdf
}

/// Standard security handler document (revisions 2-4).
pub fn standard_pdf(
    user_password: &str,
    owner_password: &str,
    revision: i32,
    version: i32,
    key_length_bits: i32,
    permissions: i32,
) -> Vec<u8> {
    let owner_entry = compute_owner_entry(
        owner_password.as_bytes(),
        user_password.as_bytes(),
        revision,
        key_length_bits,
    );
    let user_entry = compute_user_entry(
        user_password.as_bytes(),
        &owner_entry,
        permissions,
        FILE_ID,
        revision,
        key_length_bits,
        true,
    );

    wrap_pdf(&format!(
        "<< /Filter /Standard /V {version} /R {revision} /Length {key_length_bits} \
         /P {permissions} /O <{o}> /U <{u}> >>",
        o = hex(&owner_entry),
        u = hex(&user_entry),
    ))
}

/// AES-256 document (revision 5 or 6).
pub fn aes256_pdf(user_password: &str, owner_password: &str, revision: i32) -> Vec<u8> {
    let file_key = [0xA5u8; 32];

    let user_validation_salt = [0x31u8; 8];
    let user_key_salt = [0x32u8; 8];
    let mut u_string = compute_hash_v5(
        user_password.as_bytes(),
        &user_validation_salt,
        &[],
        revision,
    )
    .unwrap();
    u_string.extend_from_slice(&user_validation_salt);
    u_string.extend_from_slice(&user_key_salt);

    let intermediate =
        compute_hash_v5(user_password.as_bytes(), &user_key_salt, &[], revision).unwrap();
    let ue_string = aes256_cbc_encrypt(&intermediate, &file_key);

    let owner_validation_salt = [0x33u8; 8];
    let owner_key_salt = [0x34u8; 8];
    let mut o_string = compute_hash_v5(
        owner_password.as_bytes(),
        &owner_validation_salt,
        &u_string[..48],
        revision,
    )
    .unwrap();
    o_string.extend_from_slice(&owner_validation_salt);
    o_string.extend_from_slice(&owner_key_salt);

    let intermediate = compute_hash_v5(
        owner_password.as_bytes(),
        &owner_key_salt,
        &u_string[..48],
        revision,
    )
    .unwrap();
    let oe_string = aes256_cbc_encrypt(&intermediate, &file_key);

    wrap_pdf(&format!(
        "<< /Filter /Standard /V 5 /R {revision} /Length 256 /P -4 \
         /O <{o}> /U <{u}> /OE <{oe}> /UE <{ue}> \
         /Perms <00000000000000000000000000000000> \
         /CF << /StdCF << /CFM /AESV3 /Length 32 >> >> /StmF /StdCF /StrF /StdCF >>",
        o = hex(&o_string),
        u = hex(&u_string),
        oe = hex(&oe_string),
        ue = hex(&ue_string),
    ))
}

/// Certificate-protected document.
pub fn pubsec_pdf() -> Vec<u8> {
    wrap_pdf(
        "<< /Filter /Adobe.PubSec /SubFilter /adbe.pkcs7.s5 /V 4 \
         /Recipients [ (opaque-pkcs7-blob) ] >>",
    )
}

/// Plain document with no `/Encrypt` entry.
pub fn unencrypted_pdf() -> Vec<u8> {
    let mut pdf = b"%PDF-1.4\n".to_vec();
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
    pdf.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 0 R >>\n%%EOF\n");
    pdf
}

fn aes256_cbc_encrypt(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut encryptor = cbc::Encryptor::<aes::Aes256>::new_from_slices(key, &[0u8; 16]).unwrap();
    let mut buffer = plaintext.to_vec();
    for block in buffer.chunks_exact_mut(16) {
        encryptor.encrypt_block_mut(block.into());
    }
    buffer
}
