//! # Bendy-Butt Format
//!
//! Bencoded envelopes used by meta feeds. Two signatures: one over the
//! payload by the author, one over the content by the content signer
//! (the `subfeed` named in the content, or the author).
//!
//! ```text
//! message = [ payload, signature ]
//! payload = [ author, sequence, previous, timestamp, [ content, content signature ] ]
//! ```

use std::collections::BTreeMap;

use shared_crypto::{sha256, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, NetworkKey};
use shared_types::{FeedFormat, FeedId, HashAlgo, MessageRef, Sequence};

use super::bencode::{self, Bencode};
use super::bfe::BfeValue;
use super::errors::FormatError;
use super::message::{check_previous, FeedMessage};

/// Prefix of the bytes the content signature covers.
pub const CONTENT_SIGNATURE_PREFIX: &[u8] = b"bendybutt";

/// A decoded bendy-butt message.
#[derive(Debug, Clone, PartialEq)]
pub struct BendyButtMessage {
    author: FeedId,
    sequence: Sequence,
    previous: Option<MessageRef>,
    timestamp: i64,
    content: BTreeMap<Vec<u8>, Bencode>,
    content_bytes: Vec<u8>,
    content_signature: Vec<u8>,
    payload: Vec<u8>,
    signature: Vec<u8>,
    key: MessageRef,
    raw: Vec<u8>,
}

impl BendyButtMessage {
    /// The content dictionary.
    pub fn content(&self) -> &BTreeMap<Vec<u8>, Bencode> {
        &self.content
    }

    /// Decode one content field as a typed value.
    pub fn content_field(&self, name: &str) -> Option<BfeValue> {
        self.content
            .get(name.as_bytes())
            .and_then(Bencode::as_bytes)
            .and_then(|b| BfeValue::decode(b).ok())
    }

    /// Feed whose key signed the content.
    pub fn content_signer(&self) -> FeedId {
        match self.content_field("subfeed") {
            Some(BfeValue::Feed(sub)) => sub,
            _ => self.author,
        }
    }

    /// Check the payload signature, then the content signature.
    pub fn verify(&self, network_key: Option<&NetworkKey>) -> Result<(), FormatError> {
        let payload = match network_key {
            Some(key) => key
                .auth(&self.payload)
                .map_err(|e| FormatError::BadSignature(e.to_string()))?
                .to_vec(),
            None => self.payload.clone(),
        };
        verify_with(&self.author, &payload, &self.signature).map_err(|_| {
            FormatError::BadSignature(format!("{}:{}", self.author.short(), self.sequence))
        })?;

        let mut signed = CONTENT_SIGNATURE_PREFIX.to_vec();
        signed.extend_from_slice(&self.content_bytes);
        verify_with(&self.content_signer(), &signed, &self.content_signature).map_err(|_| {
            FormatError::BadSignature(format!(
                "{}:{} content signature",
                self.author.short(),
                self.sequence
            ))
        })
    }
}

fn verify_with(feed: &FeedId, data: &[u8], signature: &[u8]) -> Result<(), FormatError> {
    let public =
        Ed25519PublicKey::from_feed(feed).map_err(|e| FormatError::BadSignature(e.to_string()))?;
    let signature = Ed25519Signature::from_slice(signature)
        .map_err(|e| FormatError::BadSignature(e.to_string()))?;
    public
        .verify(data, &signature)
        .map_err(|e| FormatError::BadSignature(e.to_string()))
}

impl FeedMessage for BendyButtMessage {
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
        Some(&self.content_bytes)
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

fn list<'a>(v: &'a Bencode, len: usize, what: &str) -> Result<&'a [Bencode], FormatError> {
    match v.as_list() {
        Some(items) if items.len() == len => Ok(items),
        Some(items) => Err(FormatError::malformed(format!(
            "{what} has {} elements, expected {len}",
            items.len()
        ))),
        None => Err(FormatError::malformed(format!("{what} is not a list"))),
    }
}

fn bfe(v: &Bencode, what: &str) -> Result<BfeValue, FormatError> {
    let bytes = v
        .as_bytes()
        .ok_or_else(|| FormatError::malformed(format!("{what} is not a byte string")))?;
    BfeValue::decode(bytes)
}

fn signature_field(v: &Bencode, what: &str) -> Result<Vec<u8>, FormatError> {
    match bfe(v, what)? {
        BfeValue::Signature(sig) if sig.len() == 64 => Ok(sig),
        _ => Err(FormatError::malformed(format!("{what} is not a 64 byte signature"))),
    }
}

/// Decode a message and compute its key. Signatures are not checked.
pub fn decode(raw: &[u8]) -> Result<BendyButtMessage, FormatError> {
    let root = bencode::decode(raw)?;
    let top = list(&root, 2, "message")?;
    let fields = list(&top[0], 5, "payload")?;
    let signature = signature_field(&top[1], "signature")?;

    let author = match bfe(&fields[0], "author")? {
        BfeValue::Feed(f) if f.format() == FeedFormat::BendyButt => f,
        BfeValue::Feed(f) => {
            return Err(FormatError::UnsupportedFormat(format!(
                "bendy-butt message from {} feed",
                f.format()
            )))
        }
        _ => return Err(FormatError::malformed("author is not a feed reference")),
    };
    let sequence = fields[1]
        .as_int()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| FormatError::malformed("sequence is not a positive integer"))?;
    let previous = match bfe(&fields[2], "previous")? {
        BfeValue::Nil => None,
        BfeValue::Message(m) if m.algo() == HashAlgo::BendyButt => Some(m),
        BfeValue::Message(m) => {
            return Err(FormatError::UnsupportedFormat(format!(
                "previous with {} hash",
                m.algo().suffix()
            )))
        }
        _ => return Err(FormatError::malformed("previous is not a message reference")),
    };
    check_previous(sequence, previous.as_ref())?;
    let timestamp = fields[3]
        .as_int()
        .ok_or_else(|| FormatError::malformed("timestamp is not an integer"))?;

    let section = list(&fields[4], 2, "content section")?;
    let content = section[0]
        .as_dict()
        .ok_or_else(|| FormatError::malformed("content is not a dictionary"))?
        .clone();
    let content_signature = signature_field(&section[1], "content signature")?;

    Ok(BendyButtMessage {
        author,
        sequence,
        previous,
        timestamp,
        content_bytes: section[0].encode(),
        content,
        content_signature,
        payload: top[0].encode(),
        signature,
        key: MessageRef::new(sha256(raw), HashAlgo::BendyButt),
        raw: raw.to_vec(),
    })
}

/// Build and sign the next bendy-butt message of `author`'s feed.
///
/// `content_signer` signs the content; it must be the `subfeed` key when the
/// content names one.
pub fn sign(
    author: &Ed25519KeyPair,
    content_signer: &Ed25519KeyPair,
    previous: Option<&MessageRef>,
    sequence: Sequence,
    timestamp: i64,
    content: BTreeMap<Vec<u8>, Bencode>,
    network_key: Option<&NetworkKey>,
) -> Result<BendyButtMessage, FormatError> {
    let content = Bencode::Dict(content);
    let mut signed_content = CONTENT_SIGNATURE_PREFIX.to_vec();
    signed_content.extend_from_slice(&content.encode());
    let content_sig = content_signer.sign(&signed_content);

    let sequence_int = i64::try_from(sequence)
        .map_err(|_| FormatError::malformed("sequence out of range"))?;
    let payload = Bencode::List(vec![
        BfeValue::Feed(author.feed_id(FeedFormat::BendyButt)).to_bencode(),
        Bencode::Int(sequence_int),
        previous
            .map_or(BfeValue::Nil, |p| BfeValue::Message(*p))
            .to_bencode(),
        Bencode::Int(timestamp),
        Bencode::List(vec![
            content,
            BfeValue::Signature(content_sig.as_bytes().to_vec()).to_bencode(),
        ]),
    ]);
    let payload_bytes = payload.encode();
    let signature = match network_key {
        Some(key) => author.sign(
            &key.auth(&payload_bytes)
                .map_err(|e| FormatError::BadSignature(e.to_string()))?,
        ),
        None => author.sign(&payload_bytes),
    };

    let message = Bencode::List(vec![
        payload,
        BfeValue::Signature(signature.as_bytes().to_vec()).to_bencode(),
    ]);
    decode(&message.encode())
}
