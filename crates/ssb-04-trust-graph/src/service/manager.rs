//! # Replication Manager
//!
//! Owns the want-list. Explicit calls mutate it immediately; the trust-graph
//! derived part is refreshed by a debounced task that waits for the log to
//! go quiet before recomputing hops.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{FeedId, LogSeq};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::errors::{AuthorizationError, GraphError};
use crate::domain::replication::{ReplicationConfig, ReplicationSet, ReplicationState};
use crate::ports::inbound::ReplicationApi;
use crate::service::scanner::ContactScanner;

pub struct ReplicationManager {
    self_id: FeedId,
    config: ReplicationConfig,
    scanner: Arc<ContactScanner>,
    state: Mutex<ReplicationState>,
    set: RwLock<Arc<ReplicationSet>>,
}

impl ReplicationManager {
    pub fn new(self_id: FeedId, config: ReplicationConfig, scanner: Arc<ContactScanner>) -> Self {
        Self {
            self_id,
            config,
            scanner,
            state: Mutex::new(ReplicationState::default()),
            set: RwLock::new(Arc::new(ReplicationSet::default())),
        }
    }

    pub fn self_id(&self) -> &FeedId {
        &self.self_id
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    fn update(&self, f: impl FnOnce(&mut ReplicationState)) -> Arc<ReplicationSet> {
        let mut state = self.state.lock();
        f(&mut state);
        let set = Arc::new(state.snapshot());
        *self.set.write() = Arc::clone(&set);
        set
    }

    /// Debounced recompute loop.
    ///
    /// Runs one recompute up front, then after every burst of log growth
    /// followed by `debounce` of quiet. A recompute is skipped when the
    /// notified position equals the last processed one. Returns when
    /// `shutdown` flips to true or either channel closes.
    pub async fn run(
        self: Arc<Self>,
        mut log_seq: watch::Receiver<Option<LogSeq>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            feed = %self.self_id,
            hops = self.config.hop_count,
            debounce_ms = self.config.debounce.as_millis() as u64,
            "replication manager started"
        );
        let mut processed = *log_seq.borrow_and_update();
        if let Err(e) = self.recompute().await {
            warn!(error = %e, "initial recompute failed");
        }

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = log_seq.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }

            // Wait for quiescence.
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.debounce) => break,
                    changed = log_seq.changed() => {
                        if changed.is_err() {
                            info!("log closed, replication manager stopping");
                            return;
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("replication manager stopped");
                        return;
                    }
                }
            }

            let notified = *log_seq.borrow_and_update();
            if notified == processed {
                continue;
            }
            match self.recompute().await {
                Ok(set) => {
                    processed = notified;
                    debug!(wanted = set.wanted().len(), blocked = set.blocked().len(), "want-list refreshed");
                }
                Err(e) => warn!(error = %e, "recompute failed, retrying on next growth"),
            }
        }
        info!("replication manager stopped");
    }
}

#[async_trait]
impl ReplicationApi for ReplicationManager {
    fn replicate(&self, id: FeedId) {
        self.update(|s| {
            s.manual_wants.insert(id);
        });
    }

    fn dont_replicate(&self, id: FeedId) {
        self.update(|s| {
            s.manual_wants.remove(&id);
        });
    }

    fn block(&self, id: FeedId) {
        self.update(|s| {
            s.manual_blocks.insert(id);
        });
    }

    fn unblock(&self, id: FeedId) {
        self.update(|s| {
            s.manual_blocks.remove(&id);
        });
    }

    fn authorize(&self, remote: &FeedId) -> bool {
        self.set.read().authorize(remote)
    }

    fn check_authorized(&self, remote: &FeedId) -> Result<(), AuthorizationError> {
        self.set.read().check(remote)
    }

    fn replication_set(&self) -> Arc<ReplicationSet> {
        Arc::clone(&self.set.read())
    }

    async fn recompute(&self) -> Result<Arc<ReplicationSet>, GraphError> {
        self.scanner.catch_up().await?;
        let graph = self.scanner.snapshot();
        let hop_wants = graph.hops(&self.self_id, self.config.hop_count);
        let graph_blocks = graph.blocked_list(&self.self_id);

        Ok(self.update(move |s| {
            s.hop_wants = hop_wants;
            s.graph_blocks = graph_blocks;
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::FeedFormat;
    use ssb_02_feed_formats::{FormatCodec, Message};
    use ssb_03_feed_validation::{FeedIngestApi, FeedIngestService, InMemoryLog, InMemoryMultiLog};
    use std::time::Duration;

    struct Node {
        ingest: FeedIngestService,
        manager: Arc<ReplicationManager>,
        me: Ed25519KeyPair,
    }

    fn node(debounce: Duration) -> Node {
        let log: Arc<InMemoryLog<Message>> = Arc::new(InMemoryLog::new());
        let ingest = FeedIngestService::new(
            Arc::new(FormatCodec::default()),
            log.clone(),
            Arc::new(InMemoryMultiLog::new()),
        );
        let me = Ed25519KeyPair::generate();
        let manager = Arc::new(ReplicationManager::new(
            me.feed_id(FeedFormat::Classic),
            ReplicationConfig {
                hop_count: 1,
                debounce,
            },
            Arc::new(ContactScanner::new(log)),
        ));
        Node { ingest, manager, me }
    }

    async fn contact(n: &Node, target: &FeedId, following: bool, blocking: bool) {
        n.ingest
            .publish(
                &n.me,
                FeedFormat::Classic,
                &json!({
                    "type": "contact",
                    "contact": target.to_string(),
                    "following": following,
                    "blocking": blocking,
                }),
            )
            .await
            .unwrap();
    }

    fn some_feed() -> FeedId {
        Ed25519KeyPair::generate().feed_id(FeedFormat::Classic)
    }

    #[tokio::test]
    async fn test_manual_calls_take_effect_immediately() {
        let n = node(Duration::from_secs(3));
        let b = some_feed();

        assert_eq!(n.manager.check_authorized(&b), Err(AuthorizationError::NotWanted(b)));
        n.manager.replicate(b);
        assert!(n.manager.authorize(&b));

        n.manager.block(b);
        assert_eq!(n.manager.check_authorized(&b), Err(AuthorizationError::Blocked(b)));
        assert!(!n.manager.replication_set().wanted().contains(&b));

        n.manager.unblock(b);
        assert!(n.manager.authorize(&b));
        n.manager.dont_replicate(b);
        assert!(!n.manager.authorize(&b));
    }

    #[tokio::test]
    async fn test_recompute_follows_then_blocks() {
        let n = node(Duration::from_secs(3));
        let b = some_feed();

        contact(&n, &b, true, false).await;
        let set = n.manager.recompute().await.unwrap();
        assert!(set.wanted().contains(&b));

        contact(&n, &b, false, true).await;
        let set = n.manager.recompute().await.unwrap();
        assert!(!set.wanted().contains(&b));
        assert!(set.blocked().contains(&b));
        assert!(!n.manager.authorize(&b));
    }

    #[tokio::test]
    async fn test_graph_block_overrides_manual_want() {
        let n = node(Duration::from_secs(3));
        let b = some_feed();
        n.manager.replicate(b);

        contact(&n, &b, false, true).await;
        n.manager.recompute().await.unwrap();
        assert_eq!(n.manager.check_authorized(&b), Err(AuthorizationError::Blocked(b)));

        contact(&n, &b, false, false).await;
        n.manager.recompute().await.unwrap();
        assert!(n.manager.authorize(&b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_debounces_until_quiet() {
        let n = node(Duration::from_secs(3));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&n.manager).run(n.ingest.log_seq(), shutdown_rx));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let b = some_feed();
        let c = some_feed();
        contact(&n, &b, true, false).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        contact(&n, &c, true, false).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Four seconds since the first contact, two since the last.
        assert!(!n.manager.authorize(&b));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(n.manager.authorize(&b));
        assert!(n.manager.authorize(&c));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
