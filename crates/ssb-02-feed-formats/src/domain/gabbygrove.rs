//! # Gabby-Grove Format
//!
//! CBOR transfer envelopes. The signature covers the encoded event; the
//! event references its content by hash and size, so content may travel
//! with the transfer or be dropped without invalidating the envelope.
//!
//! ```text
//! transfer = [ event: bytes, signature: bytes, content: bytes / null ]
//! event    = [ previous: ref / null, author: ref, sequence: uint,
//!              timestamp: int, [ content hash: ref, size: uint, type: uint ] ]
//! ref      = #6.1050(bytes: type byte || 32 bytes)
//! ```

use std::borrow::Cow;

use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};
use shared_crypto::{sha256, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, NetworkKey};
use shared_types::{FeedFormat, FeedId, Hash, HashAlgo, MessageRef, Sequence};

use super::errors::FormatError;
use super::message::{check_previous, FeedMessage};

/// CBOR tag wrapping binary references.
pub const REF_TAG: u64 = 1050;

const REF_TYPE_FEED: u8 = 0x01;
const REF_TYPE_MESSAGE: u8 = 0x02;
const REF_TYPE_CONTENT: u8 = 0x03;

/// Encoding of the content a gabby-grove event points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Unknown,
    Json,
    Cbor,
}

impl ContentType {
    fn from_u8(v: u8) -> Result<Self, FormatError> {
        match v {
            0 => Ok(ContentType::Unknown),
            1 => Ok(ContentType::Json),
            2 => Ok(ContentType::Cbor),
            other => Err(FormatError::UnsupportedFormat(format!("content type {other}"))),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ContentType::Unknown => 0,
            ContentType::Json => 1,
            ContentType::Cbor => 2,
        }
    }
}

/// A decoded gabby-grove transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct GabbyGroveMessage {
    author: FeedId,
    sequence: Sequence,
    previous: Option<MessageRef>,
    timestamp: i64,
    content_hash: Hash,
    content_size: u16,
    content_type: ContentType,
    content: Option<Vec<u8>>,
    event: Vec<u8>,
    signature: Vec<u8>,
    key: MessageRef,
    raw: Vec<u8>,
}

impl GabbyGroveMessage {
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Encoded event bytes the signature covers.
    pub fn event_bytes(&self) -> &[u8] {
        &self.event
    }

    /// Check the envelope signature, then the content against the event's
    /// declared hash and size.
    pub fn verify(&self, network_key: Option<&NetworkKey>) -> Result<(), FormatError> {
        let payload: Cow<'_, [u8]> = match network_key {
            Some(key) => Cow::Owned(
                key.auth(&self.event)
                    .map_err(|e| FormatError::BadSignature(e.to_string()))?
                    .to_vec(),
            ),
            None => Cow::Borrowed(self.event.as_slice()),
        };
        let public = Ed25519PublicKey::from_feed(&self.author)
            .map_err(|e| FormatError::BadSignature(e.to_string()))?;
        let signature = Ed25519Signature::from_slice(&self.signature)
            .map_err(|e| FormatError::BadSignature(e.to_string()))?;
        public.verify(&payload, &signature).map_err(|_| {
            FormatError::BadSignature(format!("{}:{}", self.author.short(), self.sequence))
        })?;

        if let Some(content) = &self.content {
            if content.len() != usize::from(self.content_size) {
                return Err(FormatError::BadSignature(format!(
                    "content size {} does not match declared {}",
                    content.len(),
                    self.content_size
                )));
            }
            if sha256(content) != self.content_hash {
                return Err(FormatError::BadSignature("content hash mismatch".into()));
            }
        }
        Ok(())
    }
}

impl FeedMessage for GabbyGroveMessage {
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
        self.content.as_deref()
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

/// Decode a transfer and compute its key. The signature is not checked.
pub fn decode(raw: &[u8]) -> Result<GabbyGroveMessage, FormatError> {
    let mut dec = Decoder::new(raw);
    expect_array(&mut dec, 3, "transfer")?;
    let event = dec.bytes()?.to_vec();
    let signature = dec.bytes()?.to_vec();
    let content = match dec.datatype()? {
        Type::Null => {
            dec.null()?;
            None
        }
        _ => Some(dec.bytes()?.to_vec()),
    };
    if dec.datatype().is_ok() {
        return Err(FormatError::malformed("trailing bytes after transfer"));
    }
    if signature.len() != 64 {
        return Err(FormatError::malformed(format!(
            "signature is {} bytes, expected 64",
            signature.len()
        )));
    }

    let mut ev = Decoder::new(&event);
    expect_array(&mut ev, 5, "event")?;
    let previous = match ev.datatype()? {
        Type::Null => {
            ev.null()?;
            None
        }
        _ => {
            let hash = decode_ref(&mut ev, REF_TYPE_MESSAGE)?;
            Some(MessageRef::new(hash, HashAlgo::GabbyGrove))
        }
    };
    let author = FeedId::new(decode_ref(&mut ev, REF_TYPE_FEED)?, FeedFormat::GabbyGrove);
    let sequence = ev.u64()?;
    let timestamp = ev.i64()?;
    expect_array(&mut ev, 3, "content header")?;
    let content_hash = decode_ref(&mut ev, REF_TYPE_CONTENT)?;
    let content_size = ev.u16()?;
    let content_type = ContentType::from_u8(ev.u8()?)?;
    if ev.datatype().is_ok() {
        return Err(FormatError::malformed("trailing bytes after event"));
    }
    check_previous(sequence, previous.as_ref())?;

    let key = MessageRef::new(signed_event_hash(&event, &signature)?, HashAlgo::GabbyGrove);

    Ok(GabbyGroveMessage {
        author,
        sequence,
        previous,
        timestamp,
        content_hash,
        content_size,
        content_type,
        content,
        event,
        signature,
        key,
        raw: raw.to_vec(),
    })
}

/// Build and sign the next gabby-grove transfer of `keypair`'s feed.
pub fn sign(
    keypair: &Ed25519KeyPair,
    previous: Option<&MessageRef>,
    sequence: Sequence,
    timestamp: i64,
    content: &[u8],
    content_type: ContentType,
    network_key: Option<&NetworkKey>,
) -> Result<GabbyGroveMessage, FormatError> {
    let content_size = u16::try_from(content.len())
        .map_err(|_| FormatError::malformed("content larger than 65535 bytes"))?;

    let mut event = Vec::new();
    let mut enc = Encoder::new(&mut event);
    enc.array(5)?;
    match previous {
        Some(prev) => encode_ref(&mut enc, REF_TYPE_MESSAGE, prev.hash())?,
        None => {
            enc.null()?;
        }
    }
    encode_ref(&mut enc, REF_TYPE_FEED, keypair.public_key().as_bytes())?;
    enc.u64(sequence)?.i64(timestamp)?;
    enc.array(3)?;
    encode_ref(&mut enc, REF_TYPE_CONTENT, &sha256(content))?;
    enc.u16(content_size)?.u8(content_type.as_u8())?;

    let signature = match network_key {
        Some(key) => keypair.sign(
            &key.auth(&event)
                .map_err(|e| FormatError::BadSignature(e.to_string()))?,
        ),
        None => keypair.sign(&event),
    };

    let mut raw = Vec::new();
    let mut enc = Encoder::new(&mut raw);
    enc.array(3)?
        .bytes(&event)?
        .bytes(signature.as_bytes())?
        .bytes(content)?;

    decode(&raw)
}

fn signed_event_hash(event: &[u8], signature: &[u8]) -> Result<Hash, FormatError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.array(2)?.bytes(event)?.bytes(signature)?;
    Ok(sha256(&buf))
}

fn expect_array(dec: &mut Decoder<'_>, len: u64, what: &str) -> Result<(), FormatError> {
    match dec.array()? {
        Some(n) if n == len => Ok(()),
        Some(n) => Err(FormatError::malformed(format!(
            "{what} has {n} elements, expected {len}"
        ))),
        None => Err(FormatError::malformed(format!("{what} uses indefinite length"))),
    }
}

fn decode_ref(dec: &mut Decoder<'_>, expected_type: u8) -> Result<Hash, FormatError> {
    let tag = dec.tag()?;
    if tag.as_u64() != REF_TAG {
        return Err(FormatError::malformed(format!("unexpected cbor tag {}", tag.as_u64())));
    }
    let bytes = dec.bytes()?;
    let (&ty, body) = bytes
        .split_first()
        .ok_or_else(|| FormatError::malformed("empty binary reference"))?;
    if ty != expected_type {
        return Err(FormatError::UnsupportedFormat(format!(
            "reference type {ty:#04x}, expected {expected_type:#04x}"
        )));
    }
    body.try_into()
        .map_err(|_| FormatError::malformed(format!("reference is {} bytes", body.len())))
}

fn encode_ref(
    enc: &mut Encoder<&mut Vec<u8>>,
    ref_type: u8,
    hash: &[u8; 32],
) -> Result<(), FormatError> {
    let mut bytes = Vec::with_capacity(33);
    bytes.push(ref_type);
    bytes.extend_from_slice(hash);
    enc.tag(Tag::new(REF_TAG))?.bytes(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(kp: &Ed25519KeyPair) -> GabbyGroveMessage {
        sign(kp, None, 1, 42, br#"{"type":"test"}"#, ContentType::Json, None).unwrap()
    }

    #[test]
    fn test_sign_decode_verify() {
        let kp = Ed25519KeyPair::generate();
        let msg = first(&kp);

        assert_eq!(msg.author(), &kp.feed_id(FeedFormat::GabbyGrove));
        assert_eq!(msg.sequence(), 1);
        assert_eq!(msg.timestamp(), 42);
        assert_eq!(msg.content_type(), ContentType::Json);
        assert_eq!(msg.content_bytes(), Some(&br#"{"type":"test"}"#[..]));
        assert_eq!(msg.key().algo(), HashAlgo::GabbyGrove);
        assert!(msg.verify(None).is_ok());
    }

    #[test]
    fn test_chain_links_previous() {
        let kp = Ed25519KeyPair::generate();
        let one = first(&kp);
        let two = sign(&kp, Some(one.key()), 2, 43, b"{}", ContentType::Json, None).unwrap();

        assert_eq!(two.previous(), Some(one.key()));
        assert!(two.verify(None).is_ok());
    }

    #[test]
    fn test_content_mismatch_rejected() {
        let kp = Ed25519KeyPair::generate();
        let msg = first(&kp);

        let mut raw = Vec::new();
        let mut enc = Encoder::new(&mut raw);
        enc.array(3)
            .unwrap()
            .bytes(msg.event_bytes())
            .unwrap()
            .bytes(msg.signature())
            .unwrap()
            .bytes(br#"{"type":"tset"}"#)
            .unwrap();

        let swapped = decode(&raw).unwrap();
        assert_eq!(swapped.key(), msg.key());
        assert!(matches!(swapped.verify(None), Err(FormatError::BadSignature(_))));
    }

    #[test]
    fn test_content_may_be_omitted() {
        let kp = Ed25519KeyPair::generate();
        let msg = first(&kp);

        let mut raw = Vec::new();
        let mut enc = Encoder::new(&mut raw);
        enc.array(3)
            .unwrap()
            .bytes(msg.event_bytes())
            .unwrap()
            .bytes(msg.signature())
            .unwrap()
            .null()
            .unwrap();

        let stripped = decode(&raw).unwrap();
        assert_eq!(stripped.content_bytes(), None);
        assert!(stripped.verify(None).is_ok());
    }

    #[test]
    fn test_network_key() {
        let kp = Ed25519KeyPair::generate();
        let net = NetworkKey::new([1u8; 32]);
        let msg = sign(&kp, None, 1, 0, b"{}", ContentType::Json, Some(&net)).unwrap();

        assert!(msg.verify(Some(&net)).is_ok());
        assert!(msg.verify(None).is_err());
    }

    #[test]
    fn test_rejects_garbage_and_trailing_bytes() {
        assert!(matches!(decode(b"\x01\x02"), Err(FormatError::MalformedEnvelope(_))));

        let kp = Ed25519KeyPair::generate();
        let mut raw = first(&kp).raw().to_vec();
        raw.push(0x00);
        assert!(matches!(decode(&raw), Err(FormatError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_rejects_wrong_reference_type() {
        let mut event = Vec::new();
        let mut enc = Encoder::new(&mut event);
        enc.array(5).unwrap().null().unwrap();
        // author encoded with the message type byte
        encode_ref(&mut enc, REF_TYPE_MESSAGE, &[0u8; 32]).unwrap();

        let mut raw = Vec::new();
        let mut enc = Encoder::new(&mut raw);
        enc.array(3)
            .unwrap()
            .bytes(&event)
            .unwrap()
            .bytes(&[0u8; 64])
            .unwrap()
            .null()
            .unwrap();

        assert!(matches!(decode(&raw), Err(FormatError::UnsupportedFormat(_))));
    }
}
