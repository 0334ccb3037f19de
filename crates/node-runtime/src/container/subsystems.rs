//! # Subsystem Container
//!
//! Holds every core component and wires them in dependency order:
//!
//! ```text
//! Level 0: FormatCodec (canonical encoder, network key)
//! Level 1: main log, feed index
//! Level 2: FeedIngestService, ContactScanner, ConsistencyChecker
//! Level 3: ReplicationManager
//! ```
//!
//! ## Thread Safety
//!
//! - All components wrapped in `Arc` for shared ownership
//! - Components only hold what their constructors were given; there is no
//!   process-wide state

use std::sync::Arc;

use tracing::{info, instrument};

use shared_crypto::Ed25519KeyPair;
use shared_types::FeedId;
use ssb_02_feed_formats::{FormatCodec, Message};
use ssb_03_feed_validation::{AppendOnlyLog, FeedIngestService, InMemoryLog, InMemoryMultiLog, MultiLog};
use ssb_04_trust_graph::{ContactScanner, ReplicationApi, ReplicationManager};
use ssb_05_consistency_check::ConsistencyChecker;

use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    pub config: NodeConfig,
    /// Local identity. Its feed is always replicated.
    pub identity: Ed25519KeyPair,
    pub self_id: FeedId,
    pub log: Arc<dyn AppendOnlyLog<Message>>,
    pub index: Arc<dyn MultiLog>,
    pub ingest: FeedIngestService,
    pub scanner: Arc<ContactScanner>,
    pub replication: Arc<ReplicationManager>,
    pub fsck: ConsistencyChecker,
}

impl SubsystemContainer {
    /// Build the container over in-memory logs.
    pub fn new(config: NodeConfig, identity: Ed25519KeyPair) -> Self {
        Self::with_storage(
            config,
            identity,
            Arc::new(InMemoryLog::<Message>::new()),
            Arc::new(InMemoryMultiLog::new()),
        )
    }

    /// Build the container over caller-provided storage.
    #[instrument(skip_all)]
    pub fn with_storage(
        config: NodeConfig,
        identity: Ed25519KeyPair,
        log: Arc<dyn AppendOnlyLog<Message>>,
        index: Arc<dyn MultiLog>,
    ) -> Self {
        let self_id = identity.feed_id(config.replication.feed_format);
        info!(feed = %self_id, "initializing subsystems");

        let codec = Arc::new(FormatCodec::new(config.codec_config()));
        let ingest = FeedIngestService::new(codec, Arc::clone(&log), Arc::clone(&index));
        let scanner = Arc::new(ContactScanner::new(Arc::clone(&log)));
        let fsck = ConsistencyChecker::new(Arc::clone(&log), Arc::clone(&index));
        let replication = Arc::new(ReplicationManager::new(
            self_id,
            config.manager_config(),
            Arc::clone(&scanner),
        ));
        replication.replicate(self_id);

        Self {
            config,
            identity,
            self_id,
            log,
            index,
            ingest,
            scanner,
            replication,
            fsck,
        }
    }
}
