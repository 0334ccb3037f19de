//! # Integration Scenarios

pub mod flows;
pub mod replication;

#[cfg(test)]
pub(crate) mod fixtures {
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::{FeedFormat, FeedId};
    use ssb_02_feed_formats::{FormatCodec, Message};
    use ssb_03_feed_validation::{FeedIngestApi, FeedIngestService, InMemoryLog, InMemoryMultiLog};
    use std::sync::Arc;

    /// A node with one hop of replication.
    pub fn node(hops: u32) -> NodeRuntime {
        let mut config = NodeConfig::default();
        config.replication.hop_count = hops;
        NodeRuntime::new(config, Ed25519KeyPair::generate())
    }

    /// A standalone author that signs messages elsewhere.
    pub struct Remote {
        pub keypair: Ed25519KeyPair,
        pub ingest: FeedIngestService,
    }

    impl Remote {
        pub fn new(codec: FormatCodec) -> Self {
            let log: Arc<InMemoryLog<Message>> = Arc::new(InMemoryLog::new());
            Self {
                keypair: Ed25519KeyPair::generate(),
                ingest: FeedIngestService::new(Arc::new(codec), log, Arc::new(InMemoryMultiLog::new())),
            }
        }

        pub fn id(&self, format: FeedFormat) -> FeedId {
            self.keypair.feed_id(format)
        }

        pub async fn publish(&self, format: FeedFormat, content: serde_json::Value) -> Message {
            self.ingest
                .publish(&self.keypair, format, &content)
                .await
                .unwrap()
        }
    }

    pub fn contact(target: &FeedId, following: bool, blocking: bool) -> serde_json::Value {
        serde_json::json!({
            "type": "contact",
            "contact": target.to_string(),
            "following": following,
            "blocking": blocking,
        })
    }
}
