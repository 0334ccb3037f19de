//! In-memory log adapters for tests and embedded use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use parking_lot::{Mutex, RwLock};
use shared_types::{FeedId, LogSeq};
use tokio::sync::watch;

use crate::domain::errors::LogError;
use crate::ports::outbound::{AppendOnlyLog, LogStream, MultiLog};

struct LogInner<V> {
    /// `None` marks a nulled entry.
    entries: RwLock<Vec<Option<V>>>,
    len_tx: watch::Sender<u64>,
}

/// Append-only log kept in a vector.
pub struct InMemoryLog<V> {
    inner: Arc<LogInner<V>>,
}

impl<V> Default for InMemoryLog<V> {
    fn default() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(LogInner {
                entries: RwLock::new(Vec::new()),
                len_tx,
            }),
        }
    }
}

impl<V> InMemoryLog<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete the content at `seq` while keeping its position.
    pub fn null(&self, seq: LogSeq) -> Result<(), LogError> {
        let mut entries = self.inner.entries.write();
        let slot = usize::try_from(seq)
            .ok()
            .and_then(|i| entries.get_mut(i))
            .ok_or(LogError::NotFound(seq))?;
        *slot = None;
        Ok(())
    }
}

fn read_at<V: Clone>(entries: &[Option<V>], seq: LogSeq) -> Option<Result<V, LogError>> {
    let entry = usize::try_from(seq).ok().and_then(|i| entries.get(i))?;
    Some(entry.clone().ok_or(LogError::Nulled(seq)))
}

#[async_trait]
impl<V> AppendOnlyLog<V> for InMemoryLog<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn append(&self, value: V) -> Result<LogSeq, LogError> {
        let mut entries = self.inner.entries.write();
        entries.push(Some(value));
        let len = entries.len() as u64;
        drop(entries);
        self.inner.len_tx.send_replace(len);
        Ok(len - 1)
    }

    async fn get(&self, seq: LogSeq) -> Result<V, LogError> {
        read_at(&self.inner.entries.read(), seq).unwrap_or(Err(LogError::NotFound(seq)))
    }

    async fn current_seq(&self) -> Result<Option<LogSeq>, LogError> {
        Ok((self.inner.entries.read().len() as u64).checked_sub(1))
    }

    fn query(&self, from: LogSeq, live: bool) -> LogStream<V> {
        let inner = Arc::clone(&self.inner);
        let rx = inner.len_tx.subscribe();
        Box::pin(stream::unfold(
            (inner, from, rx),
            move |(inner, pos, mut rx)| async move {
                loop {
                    let next = read_at(&inner.entries.read(), pos);
                    match next {
                        Some(item) => {
                            let item = item.map(|v| (pos, v));
                            return Some((item, (inner, pos + 1, rx)));
                        }
                        None if !live => return None,
                        None => {
                            if rx.changed().await.is_err() {
                                return None;
                            }
                        }
                    }
                }
            },
        ))
    }
}

/// Per-feed index of main-log positions.
#[derive(Default)]
pub struct InMemoryMultiLog {
    logs: Mutex<HashMap<FeedId, Arc<InMemoryLog<LogSeq>>>>,
}

impl InMemoryMultiLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete sub-log of `feed`, for tests that tamper with the index.
    pub fn sublog(&self, feed: &FeedId) -> Arc<InMemoryLog<LogSeq>> {
        Arc::clone(self.logs.lock().entry(*feed).or_default())
    }
}

#[async_trait]
impl MultiLog for InMemoryMultiLog {
    async fn get(&self, feed: &FeedId) -> Result<Arc<dyn AppendOnlyLog<LogSeq>>, LogError> {
        Ok(self.sublog(feed))
    }

    async fn list(&self) -> Result<Vec<FeedId>, LogError> {
        let mut feeds: Vec<FeedId> = self.logs.lock().keys().copied().collect();
        feeds.sort();
        Ok(feeds)
    }
}
