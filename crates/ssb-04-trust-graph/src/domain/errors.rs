//! Error types for the trust graph subsystem.

use shared_types::FeedId;
use ssb_03_feed_validation::LogError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("storage error while scanning contacts: {0}")]
    Storage(#[from] LogError),
}

/// Why a remote feed is not authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("{0} is blocked")]
    Blocked(FeedId),

    #[error("{0} is not in the want-list")]
    NotWanted(FeedId),
}
