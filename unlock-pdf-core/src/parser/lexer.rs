//! Minimal PDF object tokenizer.
//!
//! Just enough of the COS syntax to walk an encryption dictionary out of a
//! hostile byte stream: integers, names with `#xx` escapes, literal and hex
//! strings, comments-as-whitespace and depth-counted dictionary scanning.
//! There is deliberately no object model; every routine works on a byte
//! slice and a cursor.

/// Advance past whitespace and `%`-to-end-of-line comments.
pub(crate) fn skip_whitespace_and_comments(data: &[u8], pos: &mut usize) {
    while *pos < data.len() {
        let ch = data[*pos];
        if ch.is_ascii_whitespace() || ch == 0 {
            *pos += 1;
        } else if ch == b'%' {
            while *pos < data.len() && data[*pos] != b'\n' && data[*pos] != b'\r' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

/// Parse an optionally signed integer. Returns `None` when no digits follow.
pub(crate) fn parse_integer(data: &[u8], pos: &mut usize) -> Option<i64> {
    skip_whitespace_and_comments(data, pos);

    let mut negative = false;
    if *pos < data.len() {
        match data[*pos] {
            b'+' => *pos += 1,
            b'-' => {
                negative = true;
                *pos += 1;
            }
            _ => {}
        }
    }

    let digit_start = *pos;
    let mut value: i64 = 0;
    while *pos < data.len() && data[*pos].is_ascii_digit() {
        value = value.wrapping_mul(10).wrapping_add(i64::from(data[*pos] - b'0'));
        *pos += 1;
    }

    if *pos == digit_start {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Parse the `true`/`false` keywords.
pub(crate) fn parse_boolean(data: &[u8], pos: &mut usize) -> Option<bool> {
    skip_whitespace_and_comments(data, pos);
    if data[*pos..].starts_with(b"true") {
        *pos += 4;
        Some(true)
    } else if data[*pos..].starts_with(b"false") {
        *pos += 5;
        Some(false)
    } else {
        None
    }
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(10 + ch - b'a'),
        b'A'..=b'F' => Some(10 + ch - b'A'),
        _ => None,
    }
}

/// Parse a name token (the cursor sits just past the `/`), decoding `#xx`
/// escapes.
pub(crate) fn parse_name(data: &[u8], pos: &mut usize) -> String {
    let mut name = Vec::new();
    while *pos < data.len() {
        let ch = data[*pos];
        if ch.is_ascii_whitespace()
            || matches!(ch, b'/' | b'<' | b'>' | b'[' | b']' | b'(' | b')')
        {
            break;
        }
        if ch == b'#' {
            if *pos + 2 < data.len() {
                if let (Some(high), Some(low)) =
                    (hex_value(data[*pos + 1]), hex_value(data[*pos + 2]))
                {
                    name.push((high << 4) | low);
                    *pos += 3;
                    continue;
                }
            }
            *pos += 1;
        } else {
            name.push(ch);
            *pos += 1;
        }
    }
    String::from_utf8_lossy(&name).into_owned()
}

/// Parse a hex string `<...>`. An odd trailing nibble is padded with `0`.
pub(crate) fn parse_hex_string(data: &[u8], pos: &mut usize) -> Vec<u8> {
    let mut result = Vec::new();
    if *pos >= data.len() || data[*pos] != b'<' {
        return result;
    }
    *pos += 1;

    let mut nibbles = Vec::new();
    while *pos < data.len() && data[*pos] != b'>' {
        if !data[*pos].is_ascii_whitespace() {
            nibbles.push(data[*pos]);
        }
        *pos += 1;
    }
    if *pos < data.len() {
        *pos += 1; // closing '>'
    }

    if nibbles.len() % 2 == 1 {
        nibbles.push(b'0');
    }

    for pair in nibbles.chunks_exact(2) {
        if let (Some(high), Some(low)) = (hex_value(pair[0]), hex_value(pair[1])) {
            result.push((high << 4) | low);
        }
    }
    result
}

/// Parse a literal string `(...)` with escape sequences, octal escapes up to
/// three digits, line continuations and balanced nested parentheses.
pub(crate) fn parse_literal_string(data: &[u8], pos: &mut usize) -> Vec<u8> {
    let mut result = Vec::new();
    if *pos >= data.len() || data[*pos] != b'(' {
        return result;
    }
    *pos += 1;

    let mut depth = 1;
    while *pos < data.len() && depth > 0 {
        let ch = data[*pos];
        *pos += 1;
        match ch {
            b'\\' => {
                if *pos >= data.len() {
                    break;
                }
                let next = data[*pos];
                *pos += 1;
                match next {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(0x08),
                    b'f' => result.push(0x0C),
                    b'(' => result.push(b'('),
                    b')' => result.push(b')'),
                    b'\\' => result.push(b'\\'),
                    b'\r' => {
                        // line continuation; swallow a following LF
                        if *pos < data.len() && data[*pos] == b'\n' {
                            *pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut value = u16::from(next - b'0');
                        for _ in 0..2 {
                            if *pos < data.len() && (b'0'..=b'7').contains(&data[*pos]) {
                                value = value * 8 + u16::from(data[*pos] - b'0');
                                *pos += 1;
                            } else {
                                break;
                            }
                        }
                        result.push(value as u8);
                    }
                    other => result.push(other),
                }
            }
            b'(' => {
                result.push(b'(');
                depth += 1;
            }
            b')' => {
                depth -= 1;
                if depth > 0 {
                    result.push(b')');
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// Parse a string object of either flavor. A `<<` (dictionary) yields an
/// empty result without consuming; any other token is skipped.
pub(crate) fn parse_string_object(data: &[u8], pos: &mut usize) -> Vec<u8> {
    if *pos >= data.len() {
        return Vec::new();
    }

    match data[*pos] {
        b'<' => {
            if *pos + 1 < data.len() && data[*pos + 1] == b'<' {
                Vec::new()
            } else {
                parse_hex_string(data, pos)
            }
        }
        b'(' => parse_literal_string(data, pos),
        _ => {
            while *pos < data.len() && !data[*pos].is_ascii_whitespace() && data[*pos] != b'/' {
                *pos += 1;
            }
            Vec::new()
        }
    }
}

/// Find the position just past the `>>` matching the `<<` at `start`.
///
/// Literal strings (with backslash escapes) and hex strings are skipped so
/// their contents cannot unbalance the scan.
pub(crate) fn find_dictionary_end(data: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut pos = start;
    while pos + 1 < data.len() {
        if data[pos] == b'<' && data[pos + 1] == b'<' {
            depth += 1;
            pos += 2;
            continue;
        }
        if data[pos] == b'>' && data[pos + 1] == b'>' {
            depth -= 1;
            pos += 2;
            if depth == 0 {
                return Some(pos);
            }
            continue;
        }
        if data[pos] == b'(' {
            pos += 1;
            let mut level = 1;
            while pos < data.len() && level > 0 {
                let ch = data[pos];
                pos += 1;
                match ch {
                    b'\\' => {
                        if pos < data.len() {
                            pos += 1;
                        }
                    }
                    b'(' => level += 1,
                    b')' => level -= 1,
                    _ => {}
                }
            }
            continue;
        }
        if data[pos] == b'<' {
            pos += 1;
            while pos < data.len() && data[pos] != b'>' {
                pos += 1;
            }
            if pos < data.len() {
                pos += 1;
            }
            continue;
        }
        pos += 1;
    }
    None
}

/// Skip one object of any type, staying within `limit`.
pub(crate) fn skip_object(data: &[u8], pos: &mut usize, limit: usize) {
    skip_whitespace_and_comments(data, pos);
    if *pos >= limit {
        return;
    }

    match data[*pos] {
        b'<' => {
            if *pos + 1 < data.len() && data[*pos + 1] == b'<' {
                match find_dictionary_end(data, *pos) {
                    Some(end) if end <= limit => *pos = end,
                    _ => *pos = limit,
                }
            } else {
                parse_hex_string(data, pos);
            }
        }
        b'(' => {
            parse_literal_string(data, pos);
        }
        b'[' => {
            *pos += 1;
            let mut depth = 1;
            while *pos < limit && depth > 0 {
                skip_whitespace_and_comments(data, pos);
                if *pos >= limit {
                    break;
                }
                match data[*pos] {
                    b'[' => {
                        depth += 1;
                        *pos += 1;
                    }
                    b']' => {
                        depth -= 1;
                        *pos += 1;
                    }
                    b'(' => {
                        parse_literal_string(data, pos);
                    }
                    b'<' => {
                        if *pos + 1 < data.len() && data[*pos + 1] == b'<' {
                            match find_dictionary_end(data, *pos) {
                                Some(end) if end <= limit => *pos = end,
                                _ => *pos = limit,
                            }
                        } else {
                            parse_hex_string(data, pos);
                        }
                    }
                    _ => *pos += 1,
                }
            }
        }
        _ => {
            while *pos < limit && !data[*pos].is_ascii_whitespace() && data[*pos] != b'/' {
                *pos += 1;
            }
        }
    }
}

/// Find `token` at a token boundary (the byte after the match must not be a
/// regular name character), searching from `from`.
pub(crate) fn find_token(data: &[u8], token: &[u8], from: usize) -> Option<usize> {
    if token.is_empty() || data.len() < token.len() {
        return None;
    }
    let mut start = from;
    while start + token.len() <= data.len() {
        let candidate = data[start..]
            .windows(token.len())
            .position(|window| window == token)?
            + start;

        let after = candidate + token.len();
        let boundary_ok = after >= data.len()
            || !(data[after].is_ascii_alphanumeric() || data[after] == b'_');
        if boundary_ok {
            return Some(candidate);
        }
        start = candidate + 1;
    }
    None
}
