//! # Format Codec Service
//!
//! Dispatches decode, verify and create to the per-format modules by tag and
//! carries the verification settings: optional network key and the classic
//! field-order check.

use shared_crypto::{Ed25519KeyPair, NetworkKey};
use shared_types::{FeedFormat, MessageRef, Sequence};
use ssb_01_canonical_json::CanonicalEncoder;
use tracing::debug;

use crate::domain::errors::FormatError;
use crate::domain::gabbygrove::ContentType;
use crate::domain::message::{FeedMessage, Message};
use crate::domain::{bendybutt, bfe, classic, gabbygrove};
use crate::ports::inbound::FormatCodecApi;

/// Verification settings.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Network key scoping signatures to a private network.
    pub network_key: Option<NetworkKey>,
    /// Reject classic messages whose fields are not in a reference order.
    pub strict_field_order: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            network_key: None,
            strict_field_order: true,
        }
    }
}

/// The format codec.
#[derive(Debug, Clone, Default)]
pub struct FormatCodec {
    config: CodecConfig,
    encoder: CanonicalEncoder,
}

impl FormatCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            encoder: CanonicalEncoder::new(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl FormatCodecApi for FormatCodec {
    fn decode(&self, format: FeedFormat, raw: &[u8]) -> Result<Message, FormatError> {
        let msg: Message = match format {
            FeedFormat::Classic => {
                classic::decode(&self.encoder, raw, self.config.strict_field_order)?.into()
            }
            FeedFormat::GabbyGrove => gabbygrove::decode(raw)?.into(),
            FeedFormat::BendyButt => bendybutt::decode(raw)?.into(),
        };
        Ok(msg)
    }

    fn verify(&self, msg: &Message) -> Result<(), FormatError> {
        let key = self.config.network_key.as_ref();
        let result = match msg {
            Message::Classic(m) => m.verify(key),
            Message::GabbyGrove(m) => m.verify(key),
            Message::BendyButt(m) => m.verify(key),
        };
        if let Err(e) = &result {
            debug!(feed = %msg.author(), seq = msg.sequence(), error = %e, "signature rejected");
        }
        result
    }

    fn create(
        &self,
        keypair: &Ed25519KeyPair,
        format: FeedFormat,
        previous: Option<&MessageRef>,
        sequence: Sequence,
        timestamp: i64,
        content: &serde_json::Value,
    ) -> Result<Message, FormatError> {
        let key = self.config.network_key.as_ref();
        let msg: Message = match format {
            FeedFormat::Classic => classic::sign(
                &self.encoder,
                keypair,
                previous,
                sequence,
                timestamp,
                content,
                key,
            )?
            .into(),
            FeedFormat::GabbyGrove => {
                let bytes = serde_json::to_vec(content)
                    .map_err(|e| FormatError::malformed(e.to_string()))?;
                gabbygrove::sign(
                    keypair,
                    previous,
                    sequence,
                    timestamp,
                    &bytes,
                    ContentType::Json,
                    key,
                )?
                .into()
            }
            FeedFormat::BendyButt => bendybutt::sign(
                keypair,
                keypair,
                previous,
                sequence,
                timestamp,
                bfe::content_from_json(content)?,
                key,
            )?
            .into(),
        };
        Ok(msg)
    }
}
