//! Error types for the log ports and the ingest path.

use shared_types::{FeedId, LogSeq};
use ssb_02_feed_formats::FormatError;
use thiserror::Error;

use super::validator::RejectReason;

/// Errors raised by an append-only log backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("no entry at log position {0}")]
    NotFound(LogSeq),

    /// The entry existed but its content has been deleted.
    #[error("entry at log position {0} has been nulled")]
    Nulled(LogSeq),

    #[error("log backend failure: {0}")]
    Backend(String),
}

/// Why a candidate message was not appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Malformed envelope or unsupported format. Never retried.
    #[error("decode failed: {0}")]
    Decode(FormatError),

    #[error("bad signature: {0}")]
    BadSignature(String),

    /// The sequencing rule rejected the candidate. Feed state is untouched.
    #[error("sequence violation on {feed}: {reason}")]
    SequenceViolation { feed: FeedId, reason: RejectReason },

    #[error("storage error: {0}")]
    Storage(#[from] LogError),

    /// A replication stream for one feed delivered another feed's message.
    #[error("expected a message from {expected}, got one from {found}")]
    FeedMismatch { expected: FeedId, found: FeedId },

    /// The commit task did not run to completion.
    #[error("ingest task interrupted: {0}")]
    Interrupted(String),
}

impl From<FormatError> for IngestError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::BadSignature(reason) => IngestError::BadSignature(reason),
            other => IngestError::Decode(other),
        }
    }
}
