//! # Bencode
//!
//! Minimal strict bencode: integers, byte strings, lists and dictionaries.
//! Decoding only accepts the canonical form (no leading zeros, no `-0`,
//! dictionary keys strictly ascending), so `encode(decode(b)) == b` holds
//! for every accepted input and signatures can be checked over re-encoded
//! bytes.

use std::collections::BTreeMap;

use super::errors::FormatError;

/// Maximum nesting accepted while decoding.
const MAX_DEPTH: usize = 64;

/// A bencode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bencode {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Bencode>),
    Dict(BTreeMap<Vec<u8>, Bencode>),
}

impl Bencode {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Bencode::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Bencode::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Bencode]> {
        match self {
            Bencode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Bencode>> {
        match self {
            Bencode::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Encoded bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Bencode::Int(n) => {
                out.push(b'i');
                out.extend_from_slice(n.to_string().as_bytes());
                out.push(b'e');
            }
            Bencode::Bytes(b) => encode_bytes(out, b),
            Bencode::List(items) => {
                out.push(b'l');
                for item in items {
                    item.encode_into(out);
                }
                out.push(b'e');
            }
            Bencode::Dict(map) => {
                out.push(b'd');
                for (k, v) in map {
                    encode_bytes(out, k);
                    v.encode_into(out);
                }
                out.push(b'e');
            }
        }
    }
}

fn encode_bytes(out: &mut Vec<u8>, b: &[u8]) {
    out.extend_from_slice(b.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(b);
}

/// Decode exactly one value spanning all of `input`.
pub fn decode(input: &[u8]) -> Result<Bencode, FormatError> {
    let mut pos = 0;
    let value = decode_at(input, &mut pos, 0)?;
    if pos != input.len() {
        return Err(FormatError::malformed(format!("bencode: trailing data at {pos}")));
    }
    Ok(value)
}

fn err(pos: usize, what: &str) -> FormatError {
    FormatError::malformed(format!("bencode: {what} at {pos}"))
}

fn decode_at(input: &[u8], pos: &mut usize, depth: usize) -> Result<Bencode, FormatError> {
    if depth > MAX_DEPTH {
        return Err(err(*pos, "nesting too deep"));
    }
    match input.get(*pos) {
        Some(b'i') => {
            *pos += 1;
            let end = find(input, *pos, b'e')?;
            let n = parse_int(&input[*pos..end]).ok_or_else(|| err(*pos, "invalid integer"))?;
            *pos = end + 1;
            Ok(Bencode::Int(n))
        }
        Some(b'0'..=b'9') => decode_bytes(input, pos).map(Bencode::Bytes),
        Some(b'l') => {
            *pos += 1;
            let mut items = Vec::new();
            while input.get(*pos) != Some(&b'e') {
                if *pos >= input.len() {
                    return Err(err(*pos, "unterminated list"));
                }
                items.push(decode_at(input, pos, depth + 1)?);
            }
            *pos += 1;
            Ok(Bencode::List(items))
        }
        Some(b'd') => {
            *pos += 1;
            let mut map = BTreeMap::new();
            let mut last: Option<Vec<u8>> = None;
            while input.get(*pos) != Some(&b'e') {
                if *pos >= input.len() {
                    return Err(err(*pos, "unterminated dictionary"));
                }
                let key_pos = *pos;
                let key = decode_bytes(input, pos)?;
                if last.as_ref().is_some_and(|l| *l >= key) {
                    return Err(err(key_pos, "dictionary keys out of order"));
                }
                let value = decode_at(input, pos, depth + 1)?;
                last = Some(key.clone());
                map.insert(key, value);
            }
            *pos += 1;
            Ok(Bencode::Dict(map))
        }
        Some(_) => Err(err(*pos, "unexpected byte")),
        None => Err(err(*pos, "unexpected end")),
    }
}

fn decode_bytes(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, FormatError> {
    let colon = find(input, *pos, b':')?;
    let digits = &input[*pos..colon];
    if digits.is_empty()
        || !digits.iter().all(u8::is_ascii_digit)
        || (digits.len() > 1 && digits[0] == b'0')
    {
        return Err(err(*pos, "invalid string length"));
    }
    let len: usize = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| err(*pos, "invalid string length"))?;
    let start = colon + 1;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= input.len())
        .ok_or_else(|| err(*pos, "string exceeds input"))?;
    *pos = end;
    Ok(input[start..end].to_vec())
}

fn find(input: &[u8], from: usize, byte: u8) -> Result<usize, FormatError> {
    input[from.min(input.len())..]
        .iter()
        .position(|b| *b == byte)
        .map(|i| from + i)
        .ok_or_else(|| err(from, "unexpected end"))
}

fn parse_int(digits: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(digits).ok()?;
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let canonical = !unsigned.is_empty()
        && unsigned.bytes().all(|b| b.is_ascii_digit())
        && !(unsigned.len() > 1 && unsigned.starts_with('0'))
        && text != "-0";
    if !canonical {
        return None;
    }
    text.parse().ok()
}
