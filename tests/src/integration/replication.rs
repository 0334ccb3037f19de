//! # Replication Decisions
//!
//! Contact messages flow from the log into the trust graph and from there
//! into the want-list the authorization gate reads.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::FeedFormat;
    use ssb_02_feed_formats::{FeedMessage, FormatCodec};
    use ssb_03_feed_validation::FeedIngestApi;
    use ssb_04_trust_graph::{AuthorizationError, ReplicationApi};

    use crate::integration::fixtures::{contact, node, Remote};

    fn feed() -> shared_types::FeedId {
        Ed25519KeyPair::generate().feed_id(FeedFormat::Classic)
    }

    #[tokio::test]
    async fn test_follow_then_block_updates_want_list() {
        let runtime = node(1);
        let container = runtime.container();
        let a = container.self_id;
        let b = feed();

        container.replication.replicate(a);
        runtime.publish(&contact(&b, true, false)).await.unwrap();
        let set = container.replication.recompute().await.unwrap();
        assert!(set.wanted().contains(&b));
        assert!(container.replication.authorize(&b));

        runtime.publish(&contact(&b, false, true)).await.unwrap();
        let set = container.replication.recompute().await.unwrap();
        assert!(!set.wanted().contains(&b));
        assert_eq!(
            container.replication.check_authorized(&b),
            Err(AuthorizationError::Blocked(b))
        );
    }

    #[tokio::test]
    async fn test_second_hop_reached_through_ingested_contacts() {
        let runtime = node(2);
        let container = runtime.container();
        let b = Remote::new(FormatCodec::default());
        let b_id = b.id(FeedFormat::Classic);
        let c = feed();

        runtime.publish(&contact(&b_id, true, false)).await.unwrap();
        let msg = b.publish(FeedFormat::Classic, contact(&c, true, false)).await;
        container.ingest.ingest(&b_id, msg.raw()).await.unwrap();

        let set = container.replication.recompute().await.unwrap();
        assert!(set.wanted().contains(&b_id));
        assert!(set.wanted().contains(&c));

        // A block of our own beats the remote follow.
        runtime.publish(&contact(&c, false, true)).await.unwrap();
        let set = container.replication.recompute().await.unwrap();
        assert!(set.wanted().contains(&b_id));
        assert!(!set.wanted().contains(&c));
        assert!(set.blocked().contains(&c));
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_node_picks_up_follows_after_quiet_period() {
        let mut config = NodeConfig::default();
        config.replication.hop_count = 1;
        config.replication.debounce_ms = 500;
        let runtime = NodeRuntime::new(config, Ed25519KeyPair::generate());
        runtime.start().await.unwrap();
        let container = runtime.container();
        let b = feed();

        runtime.publish(&contact(&b, true, false)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!container.replication.authorize(&b));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(container.replication.authorize(&b));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_existing_log_contacts_rebuilt_on_start() {
        let runtime = node(1);
        let container = runtime.container();
        let b = feed();
        let msg = runtime.publish(&contact(&b, true, false)).await.unwrap();
        assert_eq!(msg.sequence(), 1);

        runtime.start().await.unwrap();
        assert!(container.scanner.snapshot().follows(&container.self_id, &b));
        runtime.shutdown().await;
    }
}
