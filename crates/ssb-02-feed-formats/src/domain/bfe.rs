//! # Binary Field Encodings
//!
//! Typed byte strings used inside bendy-butt messages: a type byte, a format
//! byte, then the payload.

use std::collections::BTreeMap;

use shared_types::{FeedFormat, FeedId, HashAlgo, MessageRef};

use super::bencode::Bencode;
use super::errors::FormatError;

const TYPE_FEED: u8 = 0x00;
const TYPE_MESSAGE: u8 = 0x01;
const TYPE_SIGNATURE: u8 = 0x04;
const TYPE_GENERIC: u8 = 0x06;

const GENERIC_STRING: u8 = 0x00;
const GENERIC_BOOL: u8 = 0x01;
const GENERIC_NIL: u8 = 0x02;
const GENERIC_BYTES: u8 = 0x03;

const TRUE: &[u8] = &[1];
const FALSE: &[u8] = &[0];
const EMPTY: &[u8] = &[];

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BfeValue {
    Feed(FeedId),
    Message(MessageRef),
    Signature(Vec<u8>),
    String(String),
    Bool(bool),
    Nil,
    Bytes(Vec<u8>),
}

fn feed_code(format: FeedFormat) -> u8 {
    match format {
        FeedFormat::Classic => 0x00,
        FeedFormat::GabbyGrove => 0x01,
        FeedFormat::BendyButt => 0x03,
    }
}

fn message_code(algo: HashAlgo) -> u8 {
    match algo {
        HashAlgo::Sha256 => 0x00,
        HashAlgo::GabbyGrove => 0x01,
        HashAlgo::BendyButt => 0x04,
    }
}

impl BfeValue {
    pub fn encode(&self) -> Vec<u8> {
        let (ty, format, body): (u8, u8, &[u8]) = match self {
            BfeValue::Feed(f) => (TYPE_FEED, feed_code(f.format()), f.key().as_slice()),
            BfeValue::Message(m) => (TYPE_MESSAGE, message_code(m.algo()), m.hash().as_slice()),
            BfeValue::Signature(s) => (TYPE_SIGNATURE, 0x00, s.as_slice()),
            BfeValue::String(s) => (TYPE_GENERIC, GENERIC_STRING, s.as_bytes()),
            BfeValue::Bool(b) => (TYPE_GENERIC, GENERIC_BOOL, if *b { TRUE } else { FALSE }),
            BfeValue::Nil => (TYPE_GENERIC, GENERIC_NIL, EMPTY),
            BfeValue::Bytes(b) => (TYPE_GENERIC, GENERIC_BYTES, b.as_slice()),
        };
        let mut out = Vec::with_capacity(2 + body.len());
        out.push(ty);
        out.push(format);
        out.extend_from_slice(body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let [ty, format, body @ ..] = bytes else {
            return Err(FormatError::malformed("bfe value shorter than two bytes"));
        };
        match (*ty, *format) {
            (TYPE_FEED, code) => {
                let format = match code {
                    0x00 => FeedFormat::Classic,
                    0x01 => FeedFormat::GabbyGrove,
                    0x03 => FeedFormat::BendyButt,
                    other => {
                        return Err(FormatError::UnsupportedFormat(format!("bfe feed {other:#04x}")))
                    }
                };
                FeedId::from_slice(body, format)
                    .map(BfeValue::Feed)
                    .map_err(|e| FormatError::malformed(e.to_string()))
            }
            (TYPE_MESSAGE, code) => {
                let algo = match code {
                    0x00 => HashAlgo::Sha256,
                    0x01 => HashAlgo::GabbyGrove,
                    0x04 => HashAlgo::BendyButt,
                    other => {
                        return Err(FormatError::UnsupportedFormat(format!(
                            "bfe message {other:#04x}"
                        )))
                    }
                };
                MessageRef::from_slice(body, algo)
                    .map(BfeValue::Message)
                    .map_err(|e| FormatError::malformed(e.to_string()))
            }
            (TYPE_SIGNATURE, 0x00) => Ok(BfeValue::Signature(body.to_vec())),
            (TYPE_GENERIC, GENERIC_STRING) => String::from_utf8(body.to_vec())
                .map(BfeValue::String)
                .map_err(|_| FormatError::malformed("bfe string is not utf-8")),
            (TYPE_GENERIC, GENERIC_BOOL) => match body {
                [0] => Ok(BfeValue::Bool(false)),
                [1] => Ok(BfeValue::Bool(true)),
                _ => Err(FormatError::malformed("invalid bfe boolean")),
            },
            (TYPE_GENERIC, GENERIC_NIL) if body.is_empty() => Ok(BfeValue::Nil),
            (TYPE_GENERIC, GENERIC_BYTES) => Ok(BfeValue::Bytes(body.to_vec())),
            (ty, format) => Err(FormatError::UnsupportedFormat(format!(
                "bfe type {ty:#04x}/{format:#04x}"
            ))),
        }
    }

    pub fn to_bencode(&self) -> Bencode {
        Bencode::Bytes(self.encode())
    }
}

/// Map a flat JSON object onto a bendy-butt content dictionary.
///
/// Strings that parse as feed or message references become typed
/// references; integers stay bencode integers.
pub fn content_from_json(
    value: &serde_json::Value,
) -> Result<BTreeMap<Vec<u8>, Bencode>, FormatError> {
    let obj = value
        .as_object()
        .ok_or_else(|| FormatError::malformed("bendy-butt content must be an object"))?;
    let mut out = BTreeMap::new();
    for (k, v) in obj {
        let encoded = match v {
            serde_json::Value::Null => BfeValue::Nil.to_bencode(),
            serde_json::Value::Bool(b) => BfeValue::Bool(*b).to_bencode(),
            serde_json::Value::Number(n) => Bencode::Int(
                n.as_i64()
                    .ok_or_else(|| FormatError::malformed(format!("{k}: not an integer")))?,
            ),
            serde_json::Value::String(s) => {
                if let Ok(feed) = s.parse::<FeedId>() {
                    BfeValue::Feed(feed).to_bencode()
                } else if let Ok(msg) = s.parse::<MessageRef>() {
                    BfeValue::Message(msg).to_bencode()
                } else {
                    BfeValue::String(s.clone()).to_bencode()
                }
            }
            _ => {
                return Err(FormatError::malformed(format!(
                    "{k}: nested values are not supported"
                )))
            }
        };
        out.insert(k.as_bytes().to_vec(), encoded);
    }
    Ok(out)
}
