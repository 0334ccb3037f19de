//! # V8 Binary Transform
//!
//! Hashes of classic messages are computed over the canonical text as the
//! reference engine held it internally: UTF-16 code units truncated to their
//! low byte. Characters outside Latin-1 therefore lose information. This is
//! frozen protocol behavior.

/// Encode `text` as UTF-16 and keep the low byte of each code unit.
pub fn internal_v8_binary(text: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(text)
        .encode_utf16()
        .map(|unit| (unit & 0xFF) as u8)
        .collect()
}
