//! # Node Runtime
//!
//! Owns the container, the shutdown signal and the background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Rebuild the trust graph from the stored log
//! 2. Spawn the debounced replication recompute task
//! 3. Signal ready
//!
//! ## Shutdown
//!
//! Every background task observes the same `watch` channel. Ingest commits
//! run in their own tasks and always finish, so no feed state is left half
//! updated.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use shared_crypto::Ed25519KeyPair;
use ssb_02_feed_formats::Message;
use ssb_03_feed_validation::FeedIngestApi;
use ssb_05_consistency_check::{ConsistencyCheckApi, ConsistencyReport, FsckError, FsckMode};

use crate::container::{NodeConfig, SubsystemContainer};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig, identity: Ed25519KeyPair) -> Self {
        Self::from_container(SubsystemContainer::new(config, identity))
    }

    pub fn from_container(container: SubsystemContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn start(&self) -> Result<()> {
        info!(
            feed = %self.container.self_id,
            hops = self.container.config.replication.hop_count,
            private_network = self.container.config.network.network_key.is_some(),
            "starting node runtime"
        );

        self.container
            .scanner
            .rebuild()
            .await
            .context("failed to build the trust graph")?;

        let manager = Arc::clone(&self.container.replication);
        let handle = tokio::spawn(manager.run(self.container.ingest.log_seq(), self.shutdown_rx.clone()));
        self.tasks.lock().push(handle);

        info!("node runtime started");
        Ok(())
    }

    /// Publish `content` on the local feed.
    pub async fn publish(&self, content: &serde_json::Value) -> Result<Message> {
        let msg = self
            .container
            .ingest
            .publish(
                &self.container.identity,
                self.container.config.replication.feed_format,
                content,
            )
            .await?;
        Ok(msg)
    }

    /// Run a consistency check. Shutdown cancels it.
    pub async fn fsck(&self, mode: FsckMode) -> Result<ConsistencyReport, FsckError> {
        let report = self.container.fsck.check(mode, self.shutdown_rx.clone()).await?;
        for feed in report.broken_feeds() {
            let mut issues = report.inconsistencies_of(&feed);
            if let Some(first) = issues.next() {
                warn!(
                    feed = %feed,
                    log_seq = first.log_seq,
                    expected = first.expected,
                    found = first.found,
                    more = issues.count(),
                    "feed failed consistency check"
                );
            }
        }
        Ok(report)
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub async fn shutdown(&self) {
        info!("initiating graceful shutdown");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "background task failed"),
                Err(_) => warn!("background task did not stop in time"),
            }
        }
        info!("shutdown complete");
    }

    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }
}
