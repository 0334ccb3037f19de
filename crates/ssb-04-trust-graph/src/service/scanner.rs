//! # Contact Scanner
//!
//! Tails the main log, folds contact messages into a working graph and
//! publishes immutable snapshots. Readers hold an `Arc<TrustGraph>` and never
//! observe a graph that is being built.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::RwLock;
use shared_types::LogSeq;
use ssb_02_feed_formats::{Contact, FeedMessage, Message};
use ssb_03_feed_validation::{AppendOnlyLog, LogError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::errors::GraphError;
use crate::domain::graph::TrustGraph;

#[derive(Default)]
struct ScanState {
    graph: TrustGraph,
    /// Next main-log position to read.
    next: LogSeq,
}

pub struct ContactScanner {
    log: Arc<dyn AppendOnlyLog<Message>>,
    working: AsyncMutex<ScanState>,
    snapshot: RwLock<Arc<TrustGraph>>,
}

impl ContactScanner {
    pub fn new(log: Arc<dyn AppendOnlyLog<Message>>) -> Self {
        Self {
            log,
            working: AsyncMutex::new(ScanState::default()),
            snapshot: RwLock::new(Arc::new(TrustGraph::new())),
        }
    }

    /// Latest published graph.
    pub fn snapshot(&self) -> Arc<TrustGraph> {
        Arc::clone(&self.snapshot.read())
    }

    /// Fold in every message appended since the last scan. Returns whether a
    /// new snapshot was published.
    pub async fn catch_up(&self) -> Result<bool, GraphError> {
        let mut state = self.working.lock().await;
        let changed = self.scan(&mut state).await?;
        if changed {
            self.publish(&state);
        }
        Ok(changed)
    }

    /// Discard the graph and replay the whole log.
    pub async fn rebuild(&self) -> Result<(), GraphError> {
        let mut state = self.working.lock().await;
        *state = ScanState::default();
        self.scan(&mut state).await?;
        self.publish(&state);
        info!(feeds = state.graph.len(), next = state.next, "trust graph rebuilt");
        Ok(())
    }

    async fn scan(&self, state: &mut ScanState) -> Result<bool, GraphError> {
        let mut changed = false;
        let mut entries = self.log.query(state.next, false);

        while let Some(entry) = entries.next().await {
            let (seq, msg) = match entry {
                Ok(item) => item,
                Err(LogError::Nulled(seq)) => {
                    state.next = seq + 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            state.next = seq + 1;
            if let Some(contact) = Contact::from_message(&msg) {
                changed |= state.graph.apply(&contact, msg.sequence());
            }
        }
        Ok(changed)
    }

    fn publish(&self, state: &ScanState) {
        *self.snapshot.write() = Arc::new(state.graph.clone());
        debug!(feeds = state.graph.len(), next = state.next, "trust graph snapshot published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::FeedFormat;
    use ssb_02_feed_formats::{FormatCodec, FormatCodecApi};
    use ssb_03_feed_validation::InMemoryLog;

    fn contact_msg(
        kp: &Ed25519KeyPair,
        previous: Option<&Message>,
        content: serde_json::Value,
    ) -> Message {
        FormatCodec::default()
            .create(
                kp,
                FeedFormat::Classic,
                previous.map(|p| p.key()),
                previous.map_or(1, |p| p.sequence() + 1),
                0,
                &content,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_catch_up_applies_contacts_incrementally() {
        let log: Arc<InMemoryLog<Message>> = Arc::new(InMemoryLog::new());
        let scanner = ContactScanner::new(log.clone());
        let a = Ed25519KeyPair::generate();
        let b = Ed25519KeyPair::generate().feed_id(FeedFormat::Classic);
        let a_id = a.feed_id(FeedFormat::Classic);

        let one = contact_msg(&a, None, json!({"type": "post", "text": "hi"}));
        log.append(one.clone()).await.unwrap();
        assert!(!scanner.catch_up().await.unwrap());

        let two = contact_msg(
            &a,
            Some(&one),
            json!({"type": "contact", "contact": b.to_string(), "following": true}),
        );
        log.append(two.clone()).await.unwrap();
        let before = scanner.snapshot();
        assert!(scanner.catch_up().await.unwrap());

        assert!(!before.follows(&a_id, &b));
        assert!(scanner.snapshot().follows(&a_id, &b));

        let three = contact_msg(
            &a,
            Some(&two),
            json!({"type": "contact", "contact": b.to_string(), "blocking": true}),
        );
        log.append(three).await.unwrap();
        scanner.catch_up().await.unwrap();
        assert!(scanner.snapshot().blocked(&a_id, &b));
    }

    #[tokio::test]
    async fn test_nulled_entries_skipped_and_rebuild() {
        let log: Arc<InMemoryLog<Message>> = Arc::new(InMemoryLog::new());
        let scanner = ContactScanner::new(log.clone());
        let a = Ed25519KeyPair::generate();
        let b = Ed25519KeyPair::generate().feed_id(FeedFormat::Classic);
        let a_id = a.feed_id(FeedFormat::Classic);

        let one = contact_msg(
            &a,
            None,
            json!({"type": "contact", "contact": b.to_string(), "following": true}),
        );
        log.append(one).await.unwrap();
        scanner.catch_up().await.unwrap();
        assert!(scanner.snapshot().follows(&a_id, &b));

        log.null(0).unwrap();
        scanner.rebuild().await.unwrap();
        assert!(!scanner.snapshot().follows(&a_id, &b));
    }
}
