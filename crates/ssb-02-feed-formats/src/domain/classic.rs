//! # Classic Format
//!
//! JSON messages. The signature covers the canonical text of the message
//! without its `signature` field; the key is the SHA-256 of the V8 binary
//! form of the canonical text with the signature included.

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared_crypto::{sha256, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, NetworkKey};
use shared_types::{FeedFormat, FeedId, HashAlgo, MessageRef, RefError, Sequence};
use ssb_01_canonical_json::{
    parse_value, CanonicalEncoderApi, JsonObject, JsonValue, DEFAULT_MAX_DEPTH,
};

use super::errors::FormatError;
use super::message::{check_previous, FeedMessage};

/// Suffix of a classic signature string.
pub const SIGNATURE_SUFFIX: &str = ".sig.ed25519";

/// The two top-level key orders the reference implementations produce.
pub const ACCEPTED_FIELD_ORDERS: [[&str; 7]; 2] = [
    ["previous", "author", "sequence", "timestamp", "hash", "content", "signature"],
    ["previous", "sequence", "author", "timestamp", "hash", "content", "signature"],
];

// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A decoded classic message.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicMessage {
    author: FeedId,
    sequence: Sequence,
    previous: Option<MessageRef>,
    timestamp: i64,
    content: Vec<u8>,
    signature: Vec<u8>,
    signed_bytes: Vec<u8>,
    key: MessageRef,
    raw: Vec<u8>,
}

impl ClassicMessage {
    /// Canonical bytes the signature covers.
    pub fn signed_bytes(&self) -> &[u8] {
        &self.signed_bytes
    }

    /// Check the Ed25519 signature, through the network key if one is set.
    pub fn verify(&self, network_key: Option<&NetworkKey>) -> Result<(), FormatError> {
        let payload: Cow<'_, [u8]> = match network_key {
            Some(key) => Cow::Owned(
                key.auth(&self.signed_bytes)
                    .map_err(|e| FormatError::BadSignature(e.to_string()))?
                    .to_vec(),
            ),
            None => Cow::Borrowed(self.signed_bytes.as_slice()),
        };
        let public = Ed25519PublicKey::from_feed(&self.author)
            .map_err(|e| FormatError::BadSignature(e.to_string()))?;
        let signature = Ed25519Signature::from_slice(&self.signature)
            .map_err(|e| FormatError::BadSignature(e.to_string()))?;
        public
            .verify(&payload, &signature)
            .map_err(|_| FormatError::BadSignature(format!("{}:{}", self.author.short(), self.sequence)))
    }
}

impl FeedMessage for ClassicMessage {
    fn author(&self) -> &FeedId {
        &self.author
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn previous(&self) -> Option<&MessageRef> {
        self.previous.as_ref()
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn content_bytes(&self) -> Option<&[u8]> {
        Some(&self.content)
    }

    fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn key(&self) -> &MessageRef {
        &self.key
    }

    fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Decode a classic message and compute its key.
///
/// The signature is parsed but not checked; call [`ClassicMessage::verify`].
pub fn decode(
    encoder: &impl CanonicalEncoderApi,
    raw: &[u8],
    strict_field_order: bool,
) -> Result<ClassicMessage, FormatError> {
    let mut obj = encoder.parse_object(raw)?;

    if strict_field_order {
        check_field_order(&obj)?;
    }

    let author = parse_author(field(&obj, "author")?)?;
    let sequence = parse_sequence(field(&obj, "sequence")?)?;
    let previous = parse_previous(field(&obj, "previous")?)?;
    check_previous(sequence, previous.as_ref())?;

    let timestamp = field(&obj, "timestamp")?
        .as_f64()
        .ok_or_else(|| FormatError::malformed("timestamp is not a number"))?;

    match field(&obj, "hash")?.as_str().as_deref() {
        Some("sha256") => {}
        Some(other) => return Err(FormatError::UnsupportedFormat(format!("hash {other}"))),
        None => return Err(FormatError::malformed("hash is not a string")),
    }

    let content = match field(&obj, "content")? {
        v @ (JsonValue::Object(_) | JsonValue::String(_)) => v.to_canonical_string().into_bytes(),
        _ => return Err(FormatError::malformed("content must be an object or a string")),
    };

    let signature = parse_signature(field(&obj, "signature")?)?;

    let with_signature = obj.to_canonical_bytes();
    let key = MessageRef::new(
        sha256(&encoder.internal_v8_binary(&with_signature)),
        HashAlgo::Sha256,
    );

    obj.remove("signature");
    let signed_bytes = obj.to_canonical_bytes();

    Ok(ClassicMessage {
        author,
        sequence,
        previous,
        timestamp: timestamp as i64,
        content,
        signature,
        signed_bytes,
        key,
        raw: raw.to_vec(),
    })
}

/// Build and sign the next classic message of `keypair`'s feed.
pub fn sign(
    encoder: &impl CanonicalEncoderApi,
    keypair: &Ed25519KeyPair,
    previous: Option<&MessageRef>,
    sequence: Sequence,
    timestamp: i64,
    content: &serde_json::Value,
    network_key: Option<&NetworkKey>,
) -> Result<ClassicMessage, FormatError> {
    let content_json =
        serde_json::to_vec(content).map_err(|e| FormatError::malformed(e.to_string()))?;
    let content = parse_value(&content_json, DEFAULT_MAX_DEPTH)?;

    let mut obj = JsonObject::new();
    obj.insert(
        "previous",
        previous.map_or(JsonValue::Null, |p| JsonValue::String(p.to_string().as_str().into())),
    );
    obj.insert(
        "author",
        JsonValue::String(keypair.feed_id(FeedFormat::Classic).to_string().as_str().into()),
    );
    obj.insert("sequence", JsonValue::Number(sequence as f64));
    obj.insert("timestamp", JsonValue::Number(timestamp as f64));
    obj.insert("hash", JsonValue::String("sha256".into()));
    obj.insert("content", content);

    let signed = obj.to_canonical_bytes();
    let signature = match network_key {
        Some(key) => keypair.sign(
            &key.auth(&signed)
                .map_err(|e| FormatError::BadSignature(e.to_string()))?,
        ),
        None => keypair.sign(&signed),
    };
    let sig_text = format!("{}{SIGNATURE_SUFFIX}", STANDARD.encode(signature.as_bytes()));
    obj.insert("signature", JsonValue::String(sig_text.as_str().into()));

    decode(encoder, &obj.to_canonical_bytes(), true)
}

fn field<'a>(obj: &'a JsonObject, name: &'static str) -> Result<&'a JsonValue, FormatError> {
    obj.get(name)
        .ok_or_else(|| FormatError::malformed(format!("missing field {name}")))
}

fn check_field_order(obj: &JsonObject) -> Result<(), FormatError> {
    let keys: Vec<String> = obj.keys().collect();
    let ok = ACCEPTED_FIELD_ORDERS
        .iter()
        .any(|order| keys.len() == order.len() && keys.iter().zip(order).all(|(k, o)| k == o));
    if ok {
        Ok(())
    } else {
        Err(FormatError::malformed(format!("unexpected field order {keys:?}")))
    }
}

fn ref_error(e: RefError) -> FormatError {
    match e {
        RefError::UnknownAlgo(algo) => FormatError::UnsupportedFormat(algo),
        other => FormatError::malformed(other.to_string()),
    }
}

fn parse_author(v: &JsonValue) -> Result<FeedId, FormatError> {
    let text = v
        .as_str()
        .ok_or_else(|| FormatError::malformed("author is not a string"))?;
    let author: FeedId = text.parse().map_err(ref_error)?;
    if author.format() != FeedFormat::Classic {
        return Err(FormatError::UnsupportedFormat(format!(
            "classic message from {} feed",
            author.format()
        )));
    }
    Ok(author)
}

fn parse_sequence(v: &JsonValue) -> Result<Sequence, FormatError> {
    let n = v
        .as_f64()
        .ok_or_else(|| FormatError::malformed("sequence is not a number"))?;
    if n < 1.0 || n.fract() != 0.0 || n > MAX_SAFE_INTEGER {
        return Err(FormatError::malformed(format!("invalid sequence {n}")));
    }
    Ok(n as Sequence)
}

fn parse_previous(v: &JsonValue) -> Result<Option<MessageRef>, FormatError> {
    if v.is_null() {
        return Ok(None);
    }
    let text = v
        .as_str()
        .ok_or_else(|| FormatError::malformed("previous is not a string"))?;
    let prev: MessageRef = text.parse().map_err(ref_error)?;
    if prev.algo() != HashAlgo::Sha256 {
        return Err(FormatError::UnsupportedFormat(format!(
            "classic previous with {} hash",
            prev.algo().suffix()
        )));
    }
    Ok(Some(prev))
}

fn parse_signature(v: &JsonValue) -> Result<Vec<u8>, FormatError> {
    let text = v
        .as_str()
        .ok_or_else(|| FormatError::malformed("signature is not a string"))?;
    let b64 = text
        .strip_suffix(SIGNATURE_SUFFIX)
        .ok_or_else(|| FormatError::UnsupportedFormat(format!("signature suffix in {text:?}")))?;
    let bytes = STANDARD
        .decode(b64)
        .map_err(|e| FormatError::malformed(format!("signature base64: {e}")))?;
    if bytes.len() != 64 {
        return Err(FormatError::malformed(format!(
            "signature is {} bytes, expected 64",
            bytes.len()
        )));
    }
    Ok(bytes)
}
