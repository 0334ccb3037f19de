//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_crypto::Ed25519KeyPair;
use shared_types::{FeedFormat, FeedId, LogSeq, MessageRef, Sequence};
use ssb_02_feed_formats::Message;
use tokio::sync::watch;

use crate::domain::errors::IngestError;
use crate::domain::validator::FeedState;

/// What happened to a candidate that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Appended at `log_seq` in the main log.
    Appended { log_seq: LogSeq, key: MessageRef },
    /// Beyond a gap: not appended. The caller may request the missing range.
    Skipped { latest: Sequence, found: Sequence },
}

/// Verified ingest API.
#[async_trait]
pub trait FeedIngestApi: Send + Sync {
    /// Decode, verify and append the next candidate of `feed`'s replication
    /// stream.
    async fn ingest(&self, feed: &FeedId, raw: &[u8]) -> Result<IngestOutcome, IngestError>;

    /// Latest accepted position of `feed`.
    async fn latest(&self, feed: &FeedId) -> Result<Option<FeedState>, IngestError>;

    /// Sign `content` as the next message of the keypair's feed in `format`
    /// and append it.
    async fn publish(
        &self,
        keypair: &Ed25519KeyPair,
        format: FeedFormat,
        content: &serde_json::Value,
    ) -> Result<Message, IngestError>;

    /// Main-log position of the latest appended message.
    fn log_seq(&self) -> watch::Receiver<Option<LogSeq>>;
}
