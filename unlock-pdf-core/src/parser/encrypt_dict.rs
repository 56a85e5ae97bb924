//! `/Encrypt` dictionary extraction.
//!
//! The extractor resolves the trailer's `/Encrypt` indirect reference inside
//! the raw buffer, decodes the recognized keys into an [`EncryptInfo`] and
//! pulls the first `/ID` element. Everything else in the document is ignored.

use std::collections::BTreeMap;

use tracing::debug;

use super::lexer::{
    find_dictionary_end, find_token, parse_boolean, parse_hex_string, parse_integer,
    parse_literal_string, parse_name, parse_string_object, skip_object,
    skip_whitespace_and_comments,
};
use crate::error::{Result, UnlockError};

/// Encryption-relevant subset of a PDF's trailer and encryption dictionary.
///
/// Parsed once, then borrowed immutably by every handler and worker.
#[derive(Debug, Clone)]
pub struct EncryptInfo {
    /// `/V` algorithm version (0..5)
    pub version: i32,
    /// `/R` security handler revision (0..6)
    pub revision: i32,
    /// `/Length` nominal key length in bits
    pub length: i32,
    /// `/P` permission bitmask (signed 32-bit)
    pub permissions: i32,
    /// First element of the trailer `/ID` array; may be empty
    pub id: Vec<u8>,
    /// `/U` user validation entry (32 bytes for R<=4, 48 for R>=5)
    pub u_string: Vec<u8>,
    /// `/O` owner validation entry
    pub o_string: Vec<u8>,
    /// `/UE` encrypted file key (R>=5, 32 bytes)
    pub ue_string: Vec<u8>,
    /// `/OE` encrypted file key (R>=5, 32 bytes)
    pub oe_string: Vec<u8>,
    /// `/Perms` (R>=5, 16 bytes)
    pub perms: Vec<u8>,
    /// `/Filter` security handler name
    pub filter: String,
    /// `/SubFilter`
    pub sub_filter: String,
    /// `/StmF` stream crypt filter name
    pub stream_filter: String,
    /// `/StrF` string crypt filter name
    pub string_filter: String,
    /// `/EFF` embedded-file crypt filter name
    pub ef_filter: String,
    /// Selected `/CF` entry name
    pub crypt_filter: String,
    /// Selected `/CFM` method (`V2`, `AESV2`, `AESV3`, `Identity`, `None`)
    pub crypt_filter_method: String,
    /// `/EncryptMetadata` (default true)
    pub encrypt_metadata: bool,
    /// `/Recipients` was present
    pub has_recipients: bool,
    /// False iff the document has no `/Encrypt` entry
    pub encrypted: bool,
}

impl Default for EncryptInfo {
    fn default() -> Self {
        Self {
            version: 0,
            revision: 0,
            length: 0,
            permissions: 0,
            id: Vec::new(),
            u_string: Vec::new(),
            o_string: Vec::new(),
            ue_string: Vec::new(),
            oe_string: Vec::new(),
            perms: Vec::new(),
            filter: String::new(),
            sub_filter: String::new(),
            stream_filter: String::new(),
            string_filter: String::new(),
            ef_filter: String::new(),
            crypt_filter: String::new(),
            crypt_filter_method: String::new(),
            encrypt_metadata: true,
            has_recipients: false,
            encrypted: false,
        }
    }
}

/// Human-readable description of the document's protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSummary {
    /// Effective algorithm, e.g. `AES-256` or `RC4-128`
    pub encryption: String,
    /// Method selector, e.g. `AESV3` or `V2 (crypt filter: StdCF)`
    pub method: String,
}

impl EncryptInfo {
    /// Key length in bits after applying the per-version defaults.
    pub fn effective_key_length(&self) -> i32 {
        if self.length > 0 {
            return self.length;
        }
        if self.revision >= 5 {
            256
        } else if self.version >= 4 {
            128
        } else if self.version >= 1 {
            40
        } else {
            0
        }
    }

    /// Describe the effective algorithm and method, preferring the selected
    /// crypt filter and falling back to version/revision heuristics.
    pub fn algorithm_summary(&self) -> AlgorithmSummary {
        let key_length = self.effective_key_length();

        let method_to_algorithm = |method: &str| -> String {
            match method {
                "AESV3" => "AES-256".to_string(),
                "AESV2" => match key_length {
                    bits if bits >= 128 => format!("AES-{bits}"),
                    bits if bits > 0 => format!("AES-{bits}"),
                    _ => "AES".to_string(),
                },
                "V2" => {
                    if key_length > 0 {
                        format!("RC4-{key_length}")
                    } else {
                        "RC4".to_string()
                    }
                }
                "V1" => "RC4-40".to_string(),
                "Identity" | "None" => "No encryption".to_string(),
                other => other.to_string(),
            }
        };

        let (encryption, method) = if !self.crypt_filter_method.is_empty() {
            let mut method = self.crypt_filter_method.clone();
            if !self.crypt_filter.is_empty() {
                method.push_str(&format!(" (crypt filter: {})", self.crypt_filter));
            }
            (method_to_algorithm(&self.crypt_filter_method), method)
        } else if self.revision >= 6 {
            ("AES-256".to_string(), "AESV3".to_string())
        } else if self.revision >= 5 {
            (
                "AES-256".to_string(),
                "Standard Security Handler R5".to_string(),
            )
        } else if self.version >= 4 {
            if key_length >= 128 {
                ("AES-128".to_string(), "AESV2".to_string())
            } else {
                (method_to_algorithm("V2"), "V2".to_string())
            }
        } else if self.version >= 2 {
            (method_to_algorithm("V2"), "V2".to_string())
        } else if self.version >= 1 {
            ("RC4-40".to_string(), "V1".to_string())
        } else {
            (String::new(), String::new())
        };

        AlgorithmSummary {
            encryption: if encryption.is_empty() {
                "Unknown".to_string()
            } else {
                encryption
            },
            method: if method.is_empty() {
                "Unknown".to_string()
            } else {
                method
            },
        }
    }
}

/// Parse the encryption metadata out of a raw PDF buffer.
///
/// A document without `/Encrypt` parses successfully with
/// `encrypted = false`. Only a missing `%PDF-` header or a malformed
/// encryption dictionary fail.
pub fn parse_encrypt_info(data: &[u8]) -> Result<EncryptInfo> {
    if data.len() < 5 || &data[..5] != b"%PDF-" {
        return Err(UnlockError::NotAPdf);
    }

    let mut info = EncryptInfo::default();

    let Some(encrypt_pos) = find_token(data, b"/Encrypt", 0) else {
        debug!("no /Encrypt entry found; document is not encrypted");
        info.id = extract_document_id(data);
        return Ok(info);
    };

    let mut pos = encrypt_pos + b"/Encrypt".len();
    skip_whitespace_and_comments(data, &mut pos);
    let obj_num = parse_integer(data, &mut pos).ok_or_else(|| {
        UnlockError::MalformedEncryptDictionary(
            "/Encrypt is not followed by an object reference".to_string(),
        )
    })?;
    skip_whitespace_and_comments(data, &mut pos);
    let gen_num = parse_integer(data, &mut pos).unwrap_or(0);

    debug!(obj_num, gen_num, "resolving /Encrypt reference");

    let marker = format!("{obj_num} {gen_num} obj");
    let obj_pos = find_object_marker(data, marker.as_bytes()).ok_or_else(|| {
        UnlockError::MalformedEncryptDictionary(format!("object {obj_num} {gen_num} not found"))
    })?;

    let dict_start = data[obj_pos..]
        .windows(2)
        .position(|window| window == b"<<")
        .map(|offset| offset + obj_pos)
        .ok_or_else(|| {
            UnlockError::MalformedEncryptDictionary(
                "encryption object does not contain a dictionary".to_string(),
            )
        })?;
    let dict_end = find_dictionary_end(data, dict_start).ok_or_else(|| {
        UnlockError::MalformedEncryptDictionary("unbalanced encryption dictionary".to_string())
    })?;

    parse_dictionary_body(data, dict_start + 2, dict_end, &mut info)?;

    if info.revision >= 5 && info.length == 0 {
        info.length = 256;
    }

    info.encrypted = true;
    info.id = extract_document_id(data);

    let summary = info.algorithm_summary();
    debug!(
        version = info.version,
        revision = info.revision,
        length = info.length,
        encryption = %summary.encryption,
        method = %summary.method,
        "parsed encryption dictionary"
    );

    Ok(info)
}

/// Find `N G obj` with no digit immediately before it, so `12 0 obj` does
/// not match inside `112 0 obj`.
fn find_object_marker(data: &[u8], marker: &[u8]) -> Option<usize> {
    let mut from = 0;
    while from + marker.len() <= data.len() {
        let candidate = data[from..]
            .windows(marker.len())
            .position(|window| window == marker)?
            + from;
        if candidate == 0 || !data[candidate - 1].is_ascii_digit() {
            return Some(candidate);
        }
        from = candidate + 1;
    }
    None
}

fn parse_dictionary_body(
    data: &[u8],
    body_start: usize,
    dict_end: usize,
    info: &mut EncryptInfo,
) -> Result<()> {
    let mut crypt_filter_methods: BTreeMap<String, String> = BTreeMap::new();
    let mut pos = body_start;

    while pos < dict_end {
        skip_whitespace_and_comments(data, &mut pos);
        if pos >= dict_end {
            break;
        }
        if data[pos] != b'/' {
            pos += 1;
            continue;
        }
        pos += 1;
        let key = parse_name(data, &mut pos);
        skip_whitespace_and_comments(data, &mut pos);

        match key.as_str() {
            "V" => info.version = expect_integer(data, &mut pos, "V")?,
            "R" => info.revision = expect_integer(data, &mut pos, "R")?,
            "Length" => info.length = expect_integer(data, &mut pos, "Length")?,
            "P" => info.permissions = expect_integer(data, &mut pos, "P")?,
            "U" => info.u_string = parse_string_object(data, &mut pos),
            "O" => info.o_string = parse_string_object(data, &mut pos),
            "UE" => info.ue_string = parse_string_object(data, &mut pos),
            "OE" => info.oe_string = parse_string_object(data, &mut pos),
            "Perms" => info.perms = parse_string_object(data, &mut pos),
            "Filter" => info.filter = parse_name_value(data, &mut pos, dict_end),
            "SubFilter" => info.sub_filter = parse_name_value(data, &mut pos, dict_end),
            "StmF" => info.stream_filter = parse_name_value(data, &mut pos, dict_end),
            "StrF" => info.string_filter = parse_name_value(data, &mut pos, dict_end),
            "EFF" => info.ef_filter = parse_name_value(data, &mut pos, dict_end),
            "EncryptMetadata" => {
                if let Some(value) = parse_boolean(data, &mut pos) {
                    info.encrypt_metadata = value;
                }
            }
            "Recipients" => {
                info.has_recipients = true;
                skip_object(data, &mut pos, dict_end);
            }
            "CF" => {
                parse_crypt_filters(data, &mut pos, dict_end, &mut crypt_filter_methods)?;
            }
            _ => skip_object(data, &mut pos, dict_end),
        }
    }

    select_crypt_filter(info, &crypt_filter_methods);
    Ok(())
}

fn expect_integer(data: &[u8], pos: &mut usize, key: &str) -> Result<i32> {
    parse_integer(data, pos)
        .map(|value| value as i32)
        .ok_or_else(|| {
            UnlockError::MalformedEncryptDictionary(format!("/{key} value is not an integer"))
        })
}

/// Name-typed values: consume only when an actual name follows, like the
/// reference tolerates stray value types by leaving them for the key scanner.
fn parse_name_value(data: &[u8], pos: &mut usize, limit: usize) -> String {
    if *pos < limit && data[*pos] == b'/' {
        *pos += 1;
        parse_name(data, pos)
    } else {
        String::new()
    }
}

/// Walk the `/CF` dictionary collecting each sub-dictionary's `/CFM` method.
fn parse_crypt_filters(
    data: &[u8],
    pos: &mut usize,
    dict_end: usize,
    methods: &mut BTreeMap<String, String>,
) -> Result<()> {
    if !(*pos + 1 < data.len() && data[*pos] == b'<' && data[*pos + 1] == b'<') {
        skip_object(data, pos, dict_end);
        return Ok(());
    }

    let cf_end = find_dictionary_end(data, *pos).ok_or_else(|| {
        UnlockError::MalformedEncryptDictionary("unbalanced /CF dictionary".to_string())
    })?;
    let mut cf_pos = *pos + 2;

    while cf_pos < cf_end {
        skip_whitespace_and_comments(data, &mut cf_pos);
        if cf_pos >= cf_end {
            break;
        }
        if data[cf_pos] != b'/' {
            cf_pos += 1;
            continue;
        }
        cf_pos += 1;
        let filter_name = parse_name(data, &mut cf_pos);
        skip_whitespace_and_comments(data, &mut cf_pos);
        if cf_pos >= cf_end {
            break;
        }

        if cf_pos + 1 < data.len() && data[cf_pos] == b'<' && data[cf_pos + 1] == b'<' {
            let filter_dict_end = match find_dictionary_end(data, cf_pos) {
                Some(end) if end <= cf_end => end,
                _ => {
                    return Err(UnlockError::MalformedEncryptDictionary(format!(
                        "unbalanced crypt filter dictionary for /{filter_name}"
                    )))
                }
            };
            let mut inner_pos = cf_pos + 2;
            while inner_pos < filter_dict_end {
                skip_whitespace_and_comments(data, &mut inner_pos);
                if inner_pos >= filter_dict_end {
                    break;
                }
                if data[inner_pos] != b'/' {
                    inner_pos += 1;
                    continue;
                }
                inner_pos += 1;
                let inner_key = parse_name(data, &mut inner_pos);
                skip_whitespace_and_comments(data, &mut inner_pos);

                if inner_key == "CFM" {
                    let method = if inner_pos < filter_dict_end && data[inner_pos] == b'/' {
                        inner_pos += 1;
                        parse_name(data, &mut inner_pos)
                    } else if inner_pos < filter_dict_end && data[inner_pos] == b'(' {
                        String::from_utf8_lossy(&parse_literal_string(data, &mut inner_pos))
                            .into_owned()
                    } else if inner_pos < filter_dict_end && data[inner_pos] == b'<' {
                        String::from_utf8_lossy(&parse_hex_string(data, &mut inner_pos))
                            .into_owned()
                    } else {
                        String::new()
                    };
                    if !method.is_empty() {
                        methods.insert(filter_name.clone(), method);
                    }
                } else {
                    skip_object(data, &mut inner_pos, filter_dict_end);
                }
            }
            cf_pos = filter_dict_end;
        } else {
            skip_object(data, &mut cf_pos, cf_end);
        }
    }

    *pos = cf_end;
    Ok(())
}

/// Pick the crypt filter the document actually uses: the stream filter wins,
/// then the string filter, the embedded-file filter, `StdCF`, then any entry.
fn select_crypt_filter(info: &mut EncryptInfo, methods: &BTreeMap<String, String>) {
    if methods.is_empty() {
        return;
    }

    let preferences = [
        info.stream_filter.as_str(),
        info.string_filter.as_str(),
        info.ef_filter.as_str(),
        "StdCF",
    ];
    for name in preferences {
        if name.is_empty() {
            continue;
        }
        if let Some(method) = methods.get(name) {
            info.crypt_filter = name.to_string();
            info.crypt_filter_method = method.clone();
            return;
        }
    }

    if let Some((name, method)) = methods.iter().next() {
        info.crypt_filter = name.clone();
        info.crypt_filter_method = method.clone();
    }
}

/// Pull the first string element of the `/ID` array, wherever it sits.
fn extract_document_id(data: &[u8]) -> Vec<u8> {
    let Some(id_pos) = find_token(data, b"/ID", 0) else {
        return Vec::new();
    };
    let mut pos = id_pos + 3;
    skip_whitespace_and_comments(data, &mut pos);
    if pos >= data.len() || data[pos] != b'[' {
        return Vec::new();
    }
    pos += 1;
    skip_whitespace_and_comments(data, &mut pos);
    if pos >= data.len() {
        return Vec::new();
    }
    parse_string_object(data, &mut pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02X}")).collect()
    }

    fn minimal_pdf(encrypt_dict: &str) -> Vec<u8> {
        let mut pdf = b"%PDF-1.7\n".to_vec();
        pdf.extend_from_slice(b"7 0 obj\n");
        pdf.extend_from_slice(encrypt_dict.as_bytes());
        pdf.extend_from_slice(b"\nendobj\n");
        pdf.extend_from_slice(
            b"trailer\n<< /Size 8 /Root 1 0 R /Encrypt 7 0 R /ID [<DEADBEEF> <DEADBEEF>] >>\n",
        );
        pdf.extend_from_slice(b"%%EOF\n");
        pdf
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(
            parse_encrypt_info(b"PK\x03\x04 not a pdf"),
            Err(UnlockError::NotAPdf)
        ));
        assert!(matches!(parse_encrypt_info(b""), Err(UnlockError::NotAPdf)));
    }

    #[test]
    fn test_unencrypted_document() {
        let info =
            parse_encrypt_info(b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF").unwrap();
        assert!(!info.encrypted);
    }

    #[test]
    fn test_basic_r3_dictionary() {
        let u = to_hex(&[0x11; 32]);
        let o = to_hex(&[0x22; 32]);
        let pdf = minimal_pdf(&format!(
            "<< /Filter /Standard /V 2 /R 3 /Length 128 /P -3904 /U <{u}> /O <{o}> >>"
        ));

        let info = parse_encrypt_info(&pdf).unwrap();
        assert!(info.encrypted);
        assert_eq!(info.filter, "Standard");
        assert_eq!(info.version, 2);
        assert_eq!(info.revision, 3);
        assert_eq!(info.length, 128);
        assert_eq!(info.permissions, -3904);
        assert_eq!(info.u_string, vec![0x11; 32]);
        assert_eq!(info.o_string, vec![0x22; 32]);
        assert_eq!(info.id, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(info.encrypt_metadata);
    }

    #[test]
    fn test_r6_dictionary_with_crypt_filters() {
        let u = to_hex(&[0x33; 48]);
        let o = to_hex(&[0x44; 48]);
        let ue = to_hex(&[0x55; 32]);
        let oe = to_hex(&[0x66; 32]);
        let pdf = minimal_pdf(&format!(
            "<< /Filter /Standard /V 5 /R 6 /P -4 \
             /U <{u}> /O <{o}> /UE <{ue}> /OE <{oe}> /Perms <00112233445566778899AABBCCDDEEFF> \
             /CF << /StdCF << /CFM /AESV3 /AuthEvent /DocOpen /Length 32 >> >> \
             /StmF /StdCF /StrF /StdCF /EncryptMetadata false >>"
        ));

        let info = parse_encrypt_info(&pdf).unwrap();
        assert_eq!(info.revision, 6);
        // /Length absent and R >= 5 defaults to 256
        assert_eq!(info.length, 256);
        assert_eq!(info.u_string.len(), 48);
        assert_eq!(info.ue_string.len(), 32);
        assert_eq!(info.perms.len(), 16);
        assert_eq!(info.stream_filter, "StdCF");
        assert_eq!(info.crypt_filter, "StdCF");
        assert_eq!(info.crypt_filter_method, "AESV3");
        assert!(!info.encrypt_metadata);
    }

    #[test]
    fn test_crypt_filter_preference_order() {
        let pdf = minimal_pdf(
            "<< /Filter /Standard /V 4 /R 4 /P -4 /U <00> /O <00> \
             /CF << /CustomCF << /CFM /V2 >> /StdCF << /CFM /AESV2 >> >> \
             /StmF /CustomCF >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        // the stream filter outranks StdCF
        assert_eq!(info.crypt_filter, "CustomCF");
        assert_eq!(info.crypt_filter_method, "V2");

        let pdf = minimal_pdf(
            "<< /Filter /Standard /V 4 /R 4 /P -4 /U <00> /O <00> \
             /CF << /AltCF << /CFM /V2 >> /StdCF << /CFM /AESV2 >> >> >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        // no selector names a filter, so StdCF wins over the alternative
        assert_eq!(info.crypt_filter, "StdCF");
        assert_eq!(info.crypt_filter_method, "AESV2");
    }

    #[test]
    fn test_recipients_flag() {
        let pdf = minimal_pdf(
            "<< /Filter /Adobe.PubSec /SubFilter /adbe.pkcs7.s5 /V 4 \
             /Recipients [ (payload one) (payload two) ] >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        assert!(info.has_recipients);
        assert_eq!(info.filter, "Adobe.PubSec");
        assert_eq!(info.sub_filter, "adbe.pkcs7.s5");
    }

    #[test]
    fn test_literal_string_entries() {
        let pdf = minimal_pdf("<< /Filter /Standard /V 1 /R 2 /P -1 /U (user\\(x\\)) /O (o) >>");
        let info = parse_encrypt_info(&pdf).unwrap();
        assert_eq!(info.u_string, b"user(x)".to_vec());
        assert_eq!(info.o_string, b"o".to_vec());
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let pdf = minimal_pdf(
            "<< /Filter /Standard /Custom << /Deep << /Deeper [1 2 (three)] >> >> \
             /Weird [ [nested] <DEAD> ] /V 2 /R 3 /P -1 /U <AA> /O <BB> >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        assert_eq!(info.version, 2);
        assert_eq!(info.revision, 3);
        assert_eq!(info.u_string, vec![0xAA]);
    }

    #[test]
    fn test_encrypt_metadata_token_is_not_the_reference() {
        // /EncryptMetadata appears before the trailer's /Encrypt N G R; the
        // token-boundary search must not trip on it.
        let pdf = minimal_pdf(
            "<< /Filter /Standard /V 4 /R 4 /P -4 /EncryptMetadata false /U <AA> /O <BB> >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        assert!(info.encrypted);
        assert!(!info.encrypt_metadata);
    }

    #[test]
    fn test_missing_object_is_malformed() {
        let pdf = b"%PDF-1.7\ntrailer << /Encrypt 9 0 R >>".to_vec();
        assert!(matches!(
            parse_encrypt_info(&pdf),
            Err(UnlockError::MalformedEncryptDictionary(_))
        ));
    }

    #[test]
    fn test_unbalanced_dictionary_is_malformed() {
        let pdf = b"%PDF-1.7\n7 0 obj << /V 2 /R 3 \ntrailer << /Encrypt 7 0 R >>".to_vec();
        assert!(matches!(
            parse_encrypt_info(&pdf),
            Err(UnlockError::MalformedEncryptDictionary(_))
        ));
    }

    #[test]
    fn test_non_integer_value_is_malformed() {
        let pdf = minimal_pdf("<< /Filter /Standard /V (two) /R 3 >>");
        assert!(matches!(
            parse_encrypt_info(&pdf),
            Err(UnlockError::MalformedEncryptDictionary(_))
        ));
    }

    #[test]
    fn test_comments_inside_dictionary() {
        let pdf = minimal_pdf(
            "<< % security handler\n /Filter /Standard /V 2 % rc4\n /R 3 /P -1 /U <AA> /O <BB> >>",
        );
        let info = parse_encrypt_info(&pdf).unwrap();
        assert_eq!(info.version, 2);
        assert_eq!(info.revision, 3);
    }

    #[test]
    fn test_algorithm_summary() {
        let mut info = EncryptInfo {
            revision: 6,
            version: 5,
            length: 256,
            crypt_filter: "StdCF".to_string(),
            crypt_filter_method: "AESV3".to_string(),
            ..Default::default()
        };
        let summary = info.algorithm_summary();
        assert_eq!(summary.encryption, "AES-256");
        assert_eq!(summary.method, "AESV3 (crypt filter: StdCF)");

        info.crypt_filter_method.clear();
        info.crypt_filter.clear();
        let summary = info.algorithm_summary();
        assert_eq!(summary.encryption, "AES-256");
        assert_eq!(summary.method, "AESV3");

        let info = EncryptInfo {
            version: 2,
            revision: 3,
            length: 128,
            ..Default::default()
        };
        assert_eq!(info.algorithm_summary().encryption, "RC4-128");
    }
}
