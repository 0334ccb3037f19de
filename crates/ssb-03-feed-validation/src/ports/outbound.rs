//! # Outbound Ports (Driven Ports)
//!
//! Storage the ingest path requires the host to provide. Which engine backs
//! them is irrelevant to verification and replication.
//!
//! Production: any persistent engine wrapped in these traits
//! Testing: `InMemoryLog` / `InMemoryMultiLog` in `adapters::memory`

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use shared_types::{FeedId, LogSeq};

use crate::domain::errors::LogError;

/// Lazy sequence of `(position, value)` entries.
///
/// Nulled entries surface as `Err(LogError::Nulled)` items and iteration
/// continues after them.
pub type LogStream<V> = BoxStream<'static, Result<(LogSeq, V), LogError>>;

/// An append-only log with 0-based positions.
#[async_trait]
pub trait AppendOnlyLog<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    /// Append a value and return its position.
    async fn append(&self, value: V) -> Result<LogSeq, LogError>;

    /// Read the value at `seq`.
    async fn get(&self, seq: LogSeq) -> Result<V, LogError>;

    /// Position of the last entry, `None` while empty.
    async fn current_seq(&self) -> Result<Option<LogSeq>, LogError>;

    /// Read from `from` onwards. With `live` the stream never ends and yields
    /// new entries as they are appended. A stream cannot be restarted.
    fn query(&self, from: LogSeq, live: bool) -> LogStream<V>;
}

/// Index of one sub-log of main-log positions per feed.
#[async_trait]
pub trait MultiLog: Send + Sync {
    /// Sub-log of `feed`, created empty on first access.
    async fn get(&self, feed: &FeedId) -> Result<Arc<dyn AppendOnlyLog<LogSeq>>, LogError>;

    /// Every feed that has a sub-log.
    async fn list(&self) -> Result<Vec<FeedId>, LogError>;
}
