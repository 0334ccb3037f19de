//! # Ingest and Audit Flows
//!
//! Messages enter through the verified ingest path, land in the shared main
//! log, and the consistency checker audits the result.
//!
//! ```text
//! Remote author ──raw bytes──→ FeedIngestService ──→ main log + feed index
//!                                                         │
//!                                                         ↓
//!                                               ConsistencyChecker
//! ```

#[cfg(test)]
mod tests {
    use serde_json::json;

    use shared_crypto::NetworkKey;
    use shared_types::FeedFormat;
    use ssb_01_canonical_json::canonicalize;
    use ssb_02_feed_formats::{CodecConfig, FeedMessage, FormatCodec};
    use ssb_03_feed_validation::{
        AppendOnlyLog, FeedIngestApi, IngestError, IngestOutcome, RejectReason,
    };
    use ssb_05_consistency_check::{FsckMode, InconsistencyKind};

    use crate::integration::fixtures::{node, Remote};

    #[tokio::test]
    async fn test_five_message_chain_is_consistent() {
        let runtime = node(1);
        let container = runtime.container();
        let remote = Remote::new(FormatCodec::default());
        let feed = remote.id(FeedFormat::Classic);

        for seq in 1..=5u64 {
            let msg = remote.publish(FeedFormat::Classic, json!({"type": "post", "n": seq})).await;
            let outcome = container.ingest.ingest(&feed, msg.raw()).await.unwrap();
            assert!(matches!(outcome, IngestOutcome::Appended { .. }));
        }
        assert_eq!(container.ingest.latest(&feed).await.unwrap().unwrap().sequence, 5);

        let report = runtime.fsck(FsckMode::Sequences).await.unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.messages_checked, 5);
        assert!(runtime.fsck(FsckMode::Length).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_stored_duplicate_breaks_the_feed() {
        let runtime = node(1);
        let container = runtime.container();
        let remote = Remote::new(FormatCodec::default());
        let feed = remote.id(FeedFormat::Classic);

        let mut msgs = Vec::new();
        for _ in 0..5 {
            let msg = remote.publish(FeedFormat::Classic, json!({"type": "post"})).await;
            container.ingest.ingest(&feed, msg.raw()).await.unwrap();
            msgs.push(msg);
        }

        // Online the duplicate is refused.
        let err = container.ingest.ingest(&feed, msgs[2].raw()).await.unwrap_err();
        assert_eq!(
            err,
            IngestError::SequenceViolation {
                feed,
                reason: RejectReason::NotIncreasing { latest: 5, found: 3 },
            }
        );

        // Written behind the validator's back, the audit catches it.
        let dup_pos = container.log.append(msgs[2].clone()).await.unwrap();
        let report = runtime.fsck(FsckMode::Sequences).await.unwrap();

        assert_eq!(report.inconsistencies.len(), 1);
        let issue = &report.inconsistencies[0];
        assert_eq!(issue.feed, feed);
        assert_eq!(issue.log_seq, dup_pos);
        assert_eq!((issue.expected, issue.found), (6, 3));
        assert!(matches!(issue.kind, InconsistencyKind::Rejected(_)));
        assert_eq!(report.broken_positions, (0..=dup_pos).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_out_of_order_arrival_is_skipped_until_filled() {
        let runtime = node(1);
        let container = runtime.container();
        let remote = Remote::new(FormatCodec::default());
        let feed = remote.id(FeedFormat::GabbyGrove);

        let mut msgs = Vec::new();
        for _ in 0..3 {
            msgs.push(remote.publish(FeedFormat::GabbyGrove, json!({"type": "post"})).await);
        }

        container.ingest.ingest(&feed, msgs[0].raw()).await.unwrap();
        assert_eq!(
            container.ingest.ingest(&feed, msgs[2].raw()).await.unwrap(),
            IngestOutcome::Skipped { latest: 1, found: 3 }
        );
        container.ingest.ingest(&feed, msgs[1].raw()).await.unwrap();
        container.ingest.ingest(&feed, msgs[2].raw()).await.unwrap();

        assert!(runtime.fsck(FsckMode::Sequences).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_every_format_ingests_into_one_log() {
        let runtime = node(1);
        let container = runtime.container();
        let remote = Remote::new(FormatCodec::default());

        for format in [FeedFormat::Classic, FeedFormat::GabbyGrove, FeedFormat::BendyButt] {
            let feed = remote.id(format);
            for _ in 0..2 {
                let msg = remote.publish(format, json!({"type": "post"})).await;
                container.ingest.ingest(&feed, msg.raw()).await.unwrap();
            }
        }

        let report = runtime.fsck(FsckMode::Sequences).await.unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.feeds_checked, 3);
        assert_eq!(report.messages_checked, 6);
    }

    #[tokio::test]
    async fn test_foreign_network_messages_rejected() {
        let runtime = node(1);
        let container = runtime.container();
        let remote = Remote::new(FormatCodec::new(CodecConfig {
            network_key: Some(NetworkKey::new([7u8; 32])),
            ..CodecConfig::default()
        }));

        for format in [FeedFormat::Classic, FeedFormat::GabbyGrove, FeedFormat::BendyButt] {
            let msg = remote.publish(format, json!({"type": "post"})).await;
            let err = container
                .ingest
                .ingest(&remote.id(format), msg.raw())
                .await
                .unwrap_err();
            assert!(matches!(err, IngestError::BadSignature(_)), "{format:?}: {err:?}");
            assert!(container.ingest.latest(&remote.id(format)).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_canonical_nays_rejected() {
        for nay in [
            &br#"{"a": 1, "a": 2}"#[..],
            br#"{"a": NaN}"#,
            br#"{"a": Infinity}"#,
            br#"{"a": "unterminated}"#,
            br#"[1, 2]"#,
            br#"{"a": 01}"#,
            br#"{"a": 1} x"#,
        ] {
            assert!(canonicalize(nay).is_err(), "{}", String::from_utf8_lossy(nay));
        }

        let runtime = node(1);
        let remote = Remote::new(FormatCodec::default());
        let feed = remote.id(FeedFormat::Classic);
        let err = runtime
            .container()
            .ingest
            .ingest(&feed, br#"{"previous": null, "previous": null}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }
}
