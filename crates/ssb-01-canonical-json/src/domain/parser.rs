//! # Strict JSON Parser
//!
//! Accepts exactly RFC 8259 JSON and additionally rejects duplicate object
//! keys and numbers that overflow to infinity. Anything the reference
//! encoder refuses, this parser refuses too.

use super::errors::{CanonicalError, SyntaxKind};
use super::value::{JsonObject, JsonString, JsonValue};

/// Default maximum nesting of arrays and objects.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parse a single JSON value of any type.
pub fn parse_value(input: &[u8], max_depth: usize) -> Result<JsonValue, CanonicalError> {
    let src = std::str::from_utf8(input)
        .map_err(|e| CanonicalError::at(e.valid_up_to(), SyntaxKind::InvalidUtf8))?;
    let mut parser = Parser {
        src,
        pos: 0,
        depth: 0,
        max_depth,
    };
    parser.skip_ws();
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos != src.len() {
        return Err(parser.err(SyntaxKind::TrailingData));
    }
    Ok(value)
}

/// Parse a JSON document whose top-level value must be an object.
pub fn parse_object(input: &[u8], max_depth: usize) -> Result<JsonObject, CanonicalError> {
    match parse_value(input, max_depth)? {
        JsonValue::Object(obj) => Ok(obj),
        _ => {
            let start = input
                .iter()
                .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .unwrap_or(0);
            Err(CanonicalError::at(start, SyntaxKind::NotAnObject))
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn err(&self, kind: SyntaxKind) -> CanonicalError {
        CanonicalError::at(self.pos, kind)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn unexpected(&self) -> CanonicalError {
        match self.peek_char() {
            Some(c) => self.err(SyntaxKind::UnexpectedChar(c)),
            None => self.err(SyntaxKind::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), CanonicalError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn value(&mut self) -> Result<JsonValue, CanonicalError> {
        match self.peek() {
            Some(b'{') => self.nested(|p| p.object().map(JsonValue::Object)),
            Some(b'[') => self.nested(|p| p.array().map(JsonValue::Array)),
            Some(b'"') => self.string().map(JsonValue::String),
            Some(b'-' | b'0'..=b'9') => self.number().map(JsonValue::Number),
            Some(b't') => self.literal("true", JsonValue::Bool(true)),
            Some(b'f') => self.literal("false", JsonValue::Bool(false)),
            Some(b'n') => self.literal("null", JsonValue::Null),
            _ => Err(self.unexpected()),
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CanonicalError>,
    ) -> Result<T, CanonicalError> {
        if self.depth >= self.max_depth {
            return Err(self.err(SyntaxKind::TooDeep));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn literal(&mut self, word: &str, value: JsonValue) -> Result<JsonValue, CanonicalError> {
        if self.src[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.unexpected())
        }
    }

    fn object(&mut self) -> Result<JsonObject, CanonicalError> {
        self.expect(b'{')?;
        let mut obj = JsonObject::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(obj);
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.unexpected());
            }
            let key_pos = self.pos;
            let key = self.string()?;
            if obj.contains_units(&key) {
                return Err(CanonicalError::at(
                    key_pos,
                    SyntaxKind::DuplicateKey(key.to_string_lossy()),
                ));
            }
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.value()?;
            obj.push_unchecked(key, value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(obj);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn array(&mut self) -> Result<Vec<JsonValue>, CanonicalError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            self.skip_ws();
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn string(&mut self) -> Result<JsonString, CanonicalError> {
        let start = self.pos;
        self.expect(b'"')?;
        let mut units = Vec::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(CanonicalError::at(start, SyntaxKind::UnterminatedString));
            };
            match c {
                '"' => {
                    self.pos += 1;
                    return Ok(JsonString::from_units(units));
                }
                '\\' => {
                    self.pos += 1;
                    self.escape(&mut units)?;
                }
                c if (c as u32) < 0x20 => return Err(self.err(SyntaxKind::ControlCharacter)),
                c => {
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(c.encode_utf16(&mut buf));
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn escape(&mut self, units: &mut Vec<u16>) -> Result<(), CanonicalError> {
        let Some(b) = self.peek() else {
            return Err(self.err(SyntaxKind::UnexpectedEnd));
        };
        let unit = match b {
            b'"' => 0x22,
            b'\\' => 0x5C,
            b'/' => 0x2F,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => 0x0A,
            b'r' => 0x0D,
            b't' => 0x09,
            b'u' => {
                let hex = self
                    .src
                    .get(self.pos + 1..self.pos + 5)
                    .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                    .ok_or_else(|| self.err(SyntaxKind::InvalidEscape))?;
                let unit = u16::from_str_radix(hex, 16)
                    .map_err(|_| self.err(SyntaxKind::InvalidEscape))?;
                self.pos += 5;
                units.push(unit);
                return Ok(());
            }
            _ => return Err(self.err(SyntaxKind::InvalidEscape)),
        };
        self.pos += 1;
        units.push(unit);
        Ok(())
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<f64, CanonicalError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(CanonicalError::at(start, SyntaxKind::InvalidNumber));
                }
            }
            Some(b'1'..=b'9') => {
                self.digits();
            }
            _ => return Err(CanonicalError::at(start, SyntaxKind::InvalidNumber)),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if self.digits() == 0 {
                return Err(CanonicalError::at(start, SyntaxKind::InvalidNumber));
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(CanonicalError::at(start, SyntaxKind::InvalidNumber));
            }
        }
        let text = &self.src[start..self.pos];
        let n: f64 = text
            .parse()
            .map_err(|_| CanonicalError::at(start, SyntaxKind::InvalidNumber))?;
        if !n.is_finite() {
            return Err(CanonicalError::at(start, SyntaxKind::NonFiniteNumber));
        }
        Ok(n)
    }
}
