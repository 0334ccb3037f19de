//! # Inbound Ports (Driving Ports / API)
//!
//! Decode and verify untrusted bytes, and build new signed messages.

use shared_crypto::Ed25519KeyPair;
use shared_types::{FeedFormat, MessageRef, Sequence};

use crate::domain::errors::FormatError;
use crate::domain::message::Message;

/// Format codec API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait FormatCodecApi: Send + Sync {
    /// Decode `raw` as a message of `format`. Signatures are not checked.
    fn decode(&self, format: FeedFormat, raw: &[u8]) -> Result<Message, FormatError>;

    /// Check every signature of `msg` under the configured network key.
    fn verify(&self, msg: &Message) -> Result<(), FormatError>;

    /// Decode and verify in one step.
    fn decode_verified(&self, format: FeedFormat, raw: &[u8]) -> Result<Message, FormatError> {
        let msg = self.decode(format, raw)?;
        self.verify(&msg)?;
        Ok(msg)
    }

    /// Build and sign a message with the given position in the feed.
    fn create(
        &self,
        keypair: &Ed25519KeyPair,
        format: FeedFormat,
        previous: Option<&MessageRef>,
        sequence: Sequence,
        timestamp: i64,
        content: &serde_json::Value,
    ) -> Result<Message, FormatError>;
}
