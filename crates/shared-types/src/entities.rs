//! # Core Domain Entities
//!
//! Identities and content addresses shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `FeedId`, `FeedFormat`
//! - **Addressing**: `MessageRef`, `HashAlgo`
//! - **Positions**: `Sequence` (per feed, 1-based), `LogSeq` (per log, 0-based)

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::RefError;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Position of a message inside its own feed. The first message is 1.
pub type Sequence = u64;

/// Position of an entry inside an append-only log. The first entry is 0.
pub type LogSeq = u64;

// =============================================================================
// CLUSTER B: FORMAT TAGS
// =============================================================================

/// The wire format a feed publishes in.
///
/// The format is part of the feed identity: the same key published in two
/// formats yields two distinct feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedFormat {
    /// JSON messages signed over their canonical encoding.
    Classic,
    /// CBOR transfer envelopes.
    GabbyGrove,
    /// Bencoded envelopes used by meta feeds.
    BendyButt,
}

impl FeedFormat {
    /// Suffix used in the `@<key>.<suffix>` sigil form.
    pub fn suffix(&self) -> &'static str {
        match self {
            FeedFormat::Classic => "ed25519",
            FeedFormat::GabbyGrove => "ggfeed-v1",
            FeedFormat::BendyButt => "bendybutt-v1",
        }
    }

    /// Hash algorithm tag of the messages this format produces.
    pub fn message_algo(&self) -> HashAlgo {
        match self {
            FeedFormat::Classic => HashAlgo::Sha256,
            FeedFormat::GabbyGrove => HashAlgo::GabbyGrove,
            FeedFormat::BendyButt => HashAlgo::BendyButt,
        }
    }

    fn from_suffix(suffix: &str) -> Result<Self, RefError> {
        match suffix {
            "ed25519" => Ok(FeedFormat::Classic),
            "ggfeed-v1" => Ok(FeedFormat::GabbyGrove),
            "bendybutt-v1" => Ok(FeedFormat::BendyButt),
            other => Err(RefError::UnknownAlgo(other.to_string())),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The hash algorithm tag of a message reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgo {
    /// Classic message key.
    Sha256,
    /// Gabby-grove signed event hash.
    GabbyGrove,
    /// Bendy-butt message hash.
    BendyButt,
}

impl HashAlgo {
    /// Suffix used in the `%<hash>.<suffix>` sigil form.
    pub fn suffix(&self) -> &'static str {
        match self {
            HashAlgo::Sha256 => "sha256",
            HashAlgo::GabbyGrove => "ggmsg-v1",
            HashAlgo::BendyButt => "bendybutt-v1",
        }
    }

    fn from_suffix(suffix: &str) -> Result<Self, RefError> {
        match suffix {
            "sha256" => Ok(HashAlgo::Sha256),
            "ggmsg-v1" => Ok(HashAlgo::GabbyGrove),
            "bendybutt-v1" => Ok(HashAlgo::BendyButt),
            other => Err(RefError::UnknownAlgo(other.to_string())),
        }
    }
}

// =============================================================================
// CLUSTER C: REFERENCES
// =============================================================================

/// An author's identity: public key plus feed format.
///
/// Immutable once created. Serialized as `@<base64 key>.<suffix>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct FeedId {
    key: PublicKey,
    format: FeedFormat,
}

impl FeedId {
    /// Create a feed identity from raw key bytes.
    pub fn new(key: PublicKey, format: FeedFormat) -> Self {
        Self { key, format }
    }

    /// Create a feed identity from a key slice, checking its length.
    pub fn from_slice(key: &[u8], format: FeedFormat) -> Result<Self, RefError> {
        let key: PublicKey = key
            .try_into()
            .map_err(|_| RefError::InvalidLength { expected: 32, actual: key.len() })?;
        Ok(Self { key, format })
    }

    /// Raw public key bytes.
    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// The feed's wire format.
    pub fn format(&self) -> FeedFormat {
        self.format
    }

    /// First characters of the sigil form, for log lines.
    pub fn short(&self) -> String {
        let full = self.to_string();
        full.chars().take(9).collect()
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}.{}", STANDARD.encode(self.key), self.format.suffix())
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({self})")
    }
}

impl FromStr for FeedId {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (payload, suffix) = split_sigil(s, '@')?;
        let format = FeedFormat::from_suffix(suffix)?;
        let key = decode_payload(payload)?;
        Ok(Self { key, format })
    }
}

/// Content address of a message: hash bytes plus algorithm tag.
///
/// Serialized as `%<base64 hash>.<suffix>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct MessageRef {
    hash: Hash,
    algo: HashAlgo,
}

impl MessageRef {
    /// Create a reference from raw hash bytes.
    pub fn new(hash: Hash, algo: HashAlgo) -> Self {
        Self { hash, algo }
    }

    /// Create a reference from a hash slice, checking its length.
    pub fn from_slice(hash: &[u8], algo: HashAlgo) -> Result<Self, RefError> {
        let hash: Hash = hash
            .try_into()
            .map_err(|_| RefError::InvalidLength { expected: 32, actual: hash.len() })?;
        Ok(Self { hash, algo })
    }

    /// Raw hash bytes.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Hash algorithm tag.
    pub fn algo(&self) -> HashAlgo {
        self.algo
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}.{}", STANDARD.encode(self.hash), self.algo.suffix())
    }
}

impl fmt::Debug for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageRef({self})")
    }
}

impl FromStr for MessageRef {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (payload, suffix) = split_sigil(s, '%')?;
        let algo = HashAlgo::from_suffix(suffix)?;
        let hash = decode_payload(payload)?;
        Ok(Self { hash, algo })
    }
}

fn split_sigil(s: &str, sigil: char) -> Result<(&str, &str), RefError> {
    let rest = s
        .strip_prefix(sigil)
        .ok_or_else(|| RefError::InvalidSigil { expected: sigil, input: s.to_string() })?;
    rest.rsplit_once('.')
        .ok_or_else(|| RefError::MissingSuffix(s.to_string()))
}

fn decode_payload(payload: &str) -> Result<[u8; 32], RefError> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| RefError::InvalidBase64(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| RefError::InvalidLength { expected: 32, actual: len })
}
