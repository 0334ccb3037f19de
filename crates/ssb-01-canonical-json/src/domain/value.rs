//! # Order-Preserving JSON Values
//!
//! A JSON tree that keeps object keys in encounter order and stores strings
//! as UTF-16 code units, so that escapes such as `"\ud800"` (a lone
//! surrogate) survive parsing and can be printed back exactly.

use super::printer;

/// A JSON string as UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonString(Vec<u16>);

impl JsonString {
    /// Wrap raw code units.
    pub fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    /// The code units.
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    /// Decode to a Rust string, replacing lone surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }

    /// Whether this string equals `s`.
    pub fn eq_str(&self, s: &str) -> bool {
        self.0.iter().copied().eq(s.encode_utf16())
    }
}

impl From<&str> for JsonString {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

/// A parsed JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(f64),
    String(JsonString),
    Array(Vec<JsonValue>),
    Object(JsonObject),
}

impl JsonValue {
    /// String contents, if this is a string without lone surrogates.
    pub fn as_str(&self) -> Option<String> {
        match self {
            JsonValue::String(s) => String::from_utf16(s.units()).ok(),
            _ => None,
        }
    }

    /// Numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Object contents, if this is an object.
    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            JsonValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    /// Canonical text of this value at the top indentation level.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        printer::write_value(&mut out, self, 0);
        out
    }
}

/// A JSON object with keys in encounter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonObject {
    entries: Vec<(JsonString, JsonValue)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a key is present, compared by code units.
    pub fn contains_units(&self, key: &JsonString) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_str(key))
            .map(|(_, v)| v)
    }

    /// Remove a key, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        let idx = self.entries.iter().position(|(k, _)| k.eq_str(key))?;
        Some(self.entries.remove(idx).1)
    }

    /// Set a key. An existing key keeps its position; a new key is appended.
    pub fn insert(&mut self, key: &str, value: JsonValue) {
        match self.entries.iter_mut().find(|(k, _)| k.eq_str(key)) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((JsonString::from(key), value)),
        }
    }

    pub(crate) fn push_unchecked(&mut self, key: JsonString, value: JsonValue) {
        self.entries.push((key, value));
    }

    /// Keys in order, lossily decoded.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|(k, _)| k.to_string_lossy())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JsonString, &JsonValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Canonical text of this object.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        printer::write_object(&mut out, self, 0);
        out
    }

    /// Canonical bytes of this object.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        self.to_canonical_string().into_bytes()
    }
}
