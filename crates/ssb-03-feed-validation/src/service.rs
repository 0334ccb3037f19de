//! # Feed Ingest Service
//!
//! The verified append path: decode, verify, validate against the feed's
//! latest state, append, advance.
//!
//! ## Concurrency
//!
//! Each feed has its own async mutex, so different feeds ingest in parallel
//! while candidates of one feed are serialized. The lock is taken by the
//! caller; once a candidate is accepted the owned guard moves into a spawned
//! commit task, so dropping the caller's future can never leave the feed's
//! state half updated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_crypto::Ed25519KeyPair;
use shared_types::{FeedFormat, FeedId, LogSeq};
use ssb_02_feed_formats::{FeedMessage, FormatCodecApi, Message};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use crate::domain::errors::IngestError;
use crate::domain::validator::{validate_next, Decision, FeedState, ValidatorState};
use crate::ports::inbound::{FeedIngestApi, IngestOutcome};
use crate::ports::outbound::{AppendOnlyLog, MultiLog};

/// Lazily loaded validator state of one feed. `None` until first use.
type FeedSlot = Arc<AsyncMutex<Option<ValidatorState>>>;

struct IngestInner {
    codec: Arc<dyn FormatCodecApi>,
    log: Arc<dyn AppendOnlyLog<Message>>,
    index: Arc<dyn MultiLog>,
    feeds: Mutex<HashMap<FeedId, FeedSlot>>,
    log_seq_tx: watch::Sender<Option<LogSeq>>,
}

/// Verified ingest over an abstract log and per-feed index.
#[derive(Clone)]
pub struct FeedIngestService {
    inner: Arc<IngestInner>,
}

impl FeedIngestService {
    pub fn new(
        codec: Arc<dyn FormatCodecApi>,
        log: Arc<dyn AppendOnlyLog<Message>>,
        index: Arc<dyn MultiLog>,
    ) -> Self {
        let (log_seq_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(IngestInner {
                codec,
                log,
                index,
                feeds: Mutex::new(HashMap::new()),
                log_seq_tx,
            }),
        }
    }

    /// Lock `feed` and make sure its state is loaded.
    async fn lock_feed(
        &self,
        feed: &FeedId,
    ) -> Result<OwnedMutexGuard<Option<ValidatorState>>, IngestError> {
        let slot = Arc::clone(self.inner.feeds.lock().entry(*feed).or_default());
        let mut guard = slot.lock_owned().await;
        if guard.is_none() {
            let state = self.load_state(feed).await?;
            debug!(feed = %feed, seq = state.sequence(), "feed state loaded");
            *guard = Some(state);
        }
        Ok(guard)
    }

    /// Rebuild a feed's latest state from its sub-log.
    async fn load_state(&self, feed: &FeedId) -> Result<ValidatorState, IngestError> {
        let sublog = self.inner.index.get(feed).await?;
        let Some(last) = sublog.current_seq().await? else {
            return Ok(ValidatorState::Empty);
        };
        let log_seq = sublog.get(last).await?;
        let msg = self.inner.log.get(log_seq).await?;
        Ok(ValidatorState::HasLatest(FeedState::of(&msg)))
    }

    /// Validate `msg` against the locked state and, if accepted, commit it in
    /// a task that owns the lock.
    async fn submit(
        &self,
        mut guard: OwnedMutexGuard<Option<ValidatorState>>,
        msg: Message,
    ) -> Result<IngestOutcome, IngestError> {
        let state = guard.get_or_insert_with(ValidatorState::default);
        match validate_next(state, &msg) {
            Decision::Accepted => {}
            Decision::Skip { latest, found } => {
                debug!(feed = %msg.author(), latest, found, "gap, candidate skipped");
                return Ok(IngestOutcome::Skipped { latest, found });
            }
            Decision::Reject(reason) => {
                warn!(feed = %msg.author(), seq = msg.sequence(), %reason, "candidate rejected");
                return Err(IngestError::SequenceViolation {
                    feed: *msg.author(),
                    reason,
                });
            }
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.commit(guard, msg).await })
            .await
            .map_err(|e| IngestError::Interrupted(e.to_string()))?
    }
}

impl IngestInner {
    async fn commit(
        &self,
        mut guard: OwnedMutexGuard<Option<ValidatorState>>,
        msg: Message,
    ) -> Result<IngestOutcome, IngestError> {
        let author = *msg.author();
        let key = *msg.key();
        let sublog = self.index.get(&author).await?;

        let log_seq = self.log.append(msg.clone()).await.map_err(|e| {
            error!(feed = %author, error = %e, "append to main log failed");
            e
        })?;

        // The main log is authoritative: once the message is in it the feed
        // has moved on, even if the index write below fails.
        guard.get_or_insert_with(ValidatorState::default).advance(&msg);
        drop(guard);
        self.log_seq_tx.send_replace(Some(log_seq));

        sublog.append(log_seq).await.map_err(|e| {
            error!(feed = %author, log_seq, error = %e, "append to feed index failed");
            e
        })?;

        debug!(feed = %author, seq = msg.sequence(), log_seq, "message appended");
        Ok(IngestOutcome::Appended { log_seq, key })
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[async_trait]
impl FeedIngestApi for FeedIngestService {
    async fn ingest(&self, feed: &FeedId, raw: &[u8]) -> Result<IngestOutcome, IngestError> {
        let msg = self.inner.codec.decode_verified(feed.format(), raw)?;
        if msg.author() != feed {
            return Err(IngestError::FeedMismatch {
                expected: *feed,
                found: *msg.author(),
            });
        }
        let guard = self.lock_feed(feed).await?;
        self.submit(guard, msg).await
    }

    async fn latest(&self, feed: &FeedId) -> Result<Option<FeedState>, IngestError> {
        let guard = self.lock_feed(feed).await?;
        Ok(guard.as_ref().and_then(|s| s.latest().copied()))
    }

    async fn publish(
        &self,
        keypair: &Ed25519KeyPair,
        format: FeedFormat,
        content: &serde_json::Value,
    ) -> Result<Message, IngestError> {
        let feed = keypair.feed_id(format);
        let guard = self.lock_feed(&feed).await?;
        let latest = guard.as_ref().and_then(|s| s.latest().copied());

        let msg = self.inner.codec.create(
            keypair,
            format,
            latest.as_ref().map(|s| &s.key),
            latest.map_or(1, |s| s.sequence + 1),
            now_millis(),
            content,
        )?;
        self.submit(guard, msg.clone()).await?;
        Ok(msg)
    }

    fn log_seq(&self) -> watch::Receiver<Option<LogSeq>> {
        self.inner.log_seq_tx.subscribe()
    }
}
