//! # Consistency Checker Service
//!
//! Both modes only read. Sequence mode calls the same `validate_next` the
//! ingest path uses, so what is flagged here is exactly what would have been
//! refused online, plus gaps, which a persisted feed must not contain.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use shared_types::{FeedId, LogSeq};
use ssb_02_feed_formats::{FeedMessage, Message};
use ssb_03_feed_validation::{
    validate_next, AppendOnlyLog, Decision, LogError, MultiLog, ValidatorState,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::errors::FsckError;
use crate::domain::report::{ConsistencyReport, FsckMode, Inconsistency, InconsistencyKind};
use crate::ports::inbound::ConsistencyCheckApi;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

pub struct ConsistencyChecker {
    log: Arc<dyn AppendOnlyLog<Message>>,
    index: Arc<dyn MultiLog>,
}

fn ensure_running(cancel: &watch::Receiver<bool>) -> Result<(), FsckError> {
    if *cancel.borrow() {
        Err(FsckError::Cancelled)
    } else {
        Ok(())
    }
}

/// Main-log positions recorded in a feed's sub-log. Nulled index entries
/// are skipped.
async fn indexed_positions(sublog: &dyn AppendOnlyLog<LogSeq>) -> Result<Vec<LogSeq>, FsckError> {
    let mut all = Vec::new();
    let mut entries = sublog.query(0, false);
    while let Some(entry) = entries.next().await {
        match entry {
            Ok((_, pos)) => all.push(pos),
            Err(LogError::Nulled(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(all)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl ConsistencyChecker {
    pub fn new(log: Arc<dyn AppendOnlyLog<Message>>, index: Arc<dyn MultiLog>) -> Self {
        Self { log, index }
    }

    async fn check_length(
        &self,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ConsistencyReport, FsckError> {
        let started = Instant::now();
        let mut report = ConsistencyReport::new();
        let mut positions: BTreeMap<FeedId, Vec<LogSeq>> = BTreeMap::new();
        let mut broken = BTreeSet::new();

        for feed in self.index.list().await? {
            ensure_running(cancel)?;
            let sublog = self.index.get(&feed).await?;
            let Some(last) = sublog.current_seq().await? else {
                continue;
            };
            report.feeds_checked += 1;

            let log_seq = sublog.get(last).await?;
            let msg = match self.log.get(log_seq).await {
                Ok(msg) => msg,
                Err(LogError::Nulled(_)) => {
                    report.nulled_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            report.messages_checked += 1;

            let indexed = last + 1;
            if msg.sequence() != indexed || msg.author() != &feed {
                warn!(feed = %feed, indexed, found = msg.sequence(), log_seq, "feed length mismatch");
                report.add_inconsistency(Inconsistency {
                    feed,
                    log_seq,
                    expected: indexed,
                    found: msg.sequence(),
                    kind: InconsistencyKind::Length,
                    message: msg,
                });
                broken.insert(feed);
                positions.insert(feed, indexed_positions(&*sublog).await?);
            }
        }

        report.set_broken_positions(&positions, &broken);
        report.duration_ms = elapsed_ms(started);
        info!(
            feeds = report.feeds_checked,
            inconsistencies = report.inconsistencies.len(),
            "length check finished"
        );
        Ok(report)
    }

    async fn check_sequences(
        &self,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ConsistencyReport, FsckError> {
        let started = Instant::now();
        let mut last_progress = started;
        let mut report = ConsistencyReport::new();
        let mut states: HashMap<FeedId, ValidatorState> = HashMap::new();
        // Only broken feeds: positions from the first failure onwards.
        let mut positions: BTreeMap<FeedId, Vec<LogSeq>> = BTreeMap::new();

        let total = self.log.current_seq().await?.map_or(0, |s| s + 1);
        let mut entries = self.log.query(0, false);

        while let Some(entry) = entries.next().await {
            ensure_running(cancel)?;
            let (log_seq, msg) = match entry {
                Ok(item) => item,
                Err(LogError::Nulled(_)) => {
                    report.nulled_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            report.messages_checked += 1;
            let feed = *msg.author();

            if last_progress.elapsed() >= PROGRESS_INTERVAL {
                info!(checked = report.messages_checked, total, "sequence check in progress");
                last_progress = Instant::now();
            }

            // A feed does not heal mid-scan.
            if let Some(tail) = positions.get_mut(&feed) {
                tail.push(log_seq);
                continue;
            }

            let state = states.entry(feed).or_default();
            let expected = state.sequence() + 1;
            let kind = match validate_next(state, &msg) {
                Decision::Accepted => {
                    state.advance(&msg);
                    continue;
                }
                Decision::Skip { .. } => InconsistencyKind::Gap,
                Decision::Reject(reason) => InconsistencyKind::Rejected(reason),
            };

            warn!(feed = %feed, log_seq, expected, found = msg.sequence(), ?kind, "broken feed");
            positions.insert(feed, vec![log_seq]);
            report.add_inconsistency(Inconsistency {
                feed,
                log_seq,
                expected,
                found: msg.sequence(),
                kind,
                message: msg,
            });
        }

        // Earlier positions of a broken feed come from its index.
        for (feed, tail) in positions.iter_mut() {
            ensure_running(cancel)?;
            let sublog = self.index.get(feed).await?;
            tail.extend(indexed_positions(&*sublog).await?);
        }
        let broken: BTreeSet<FeedId> = positions.keys().copied().collect();

        report.feeds_checked = states.len() as u64;
        report.set_broken_positions(&positions, &broken);
        report.duration_ms = elapsed_ms(started);
        info!(
            checked = report.messages_checked,
            feeds = report.feeds_checked,
            broken = broken.len(),
            "sequence check finished"
        );
        Ok(report)
    }
}

#[async_trait]
impl ConsistencyCheckApi for ConsistencyChecker {
    async fn check(
        &self,
        mode: FsckMode,
        cancel: watch::Receiver<bool>,
    ) -> Result<ConsistencyReport, FsckError> {
        let result = match mode {
            FsckMode::Length => self.check_length(&cancel).await,
            FsckMode::Sequences => self.check_sequences(&cancel).await,
        };
        if matches!(result, Err(FsckError::Cancelled)) {
            info!(?mode, "consistency check cancelled, partial report discarded");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::FeedFormat;
    use ssb_02_feed_formats::{FormatCodec, FormatCodecApi};
    use ssb_03_feed_validation::{InMemoryLog, InMemoryMultiLog, LogStream, RejectReason};

    struct Store {
        log: Arc<InMemoryLog<Message>>,
        index: Arc<InMemoryMultiLog>,
        checker: ConsistencyChecker,
    }

    fn store() -> Store {
        let log: Arc<InMemoryLog<Message>> = Arc::new(InMemoryLog::new());
        let index = Arc::new(InMemoryMultiLog::new());
        let checker = ConsistencyChecker::new(log.clone(), index.clone());
        Store { log, index, checker }
    }

    fn chain(kp: &Ed25519KeyPair, n: u64) -> Vec<Message> {
        let codec = FormatCodec::default();
        let mut out: Vec<Message> = Vec::new();
        for seq in 1..=n {
            let previous = out.last().map(|m| *m.key());
            out.push(
                codec
                    .create(kp, FeedFormat::Classic, previous.as_ref(), seq, 0, &json!({"type": "post"}))
                    .unwrap(),
            );
        }
        out
    }

    /// Append without validation, keeping the feed index in step.
    async fn store_raw(s: &Store, msg: &Message) -> LogSeq {
        let pos = s.log.append(msg.clone()).await.unwrap();
        s.index.sublog(msg.author()).append(pos).await.unwrap();
        pos
    }

    fn running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_clean_log_reports_nothing() {
        let s = store();
        let a = chain(&Ed25519KeyPair::generate(), 4);
        let b = chain(&Ed25519KeyPair::generate(), 2);
        for m in a.iter().chain(&b) {
            store_raw(&s, m).await;
        }

        let report = s.checker.check_all(running()).await.unwrap();
        assert!(report.is_consistent());
        assert!(report.broken_positions.is_empty());
        assert_eq!(report.feeds_checked, 2);
    }

    #[tokio::test]
    async fn test_duplicate_marks_rest_of_feed_broken() {
        let s = store();
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, 5);
        let other = chain(&Ed25519KeyPair::generate(), 1);
        for m in &msgs {
            store_raw(&s, m).await;
        }
        let dup_pos = s.log.append(msgs[2].clone()).await.unwrap();
        s.log.append(other[0].clone()).await.unwrap();

        let report = s.checker.check(FsckMode::Sequences, running()).await.unwrap();
        assert_eq!(report.inconsistencies.len(), 1);
        let issue = &report.inconsistencies[0];
        assert_eq!(issue.log_seq, dup_pos);
        assert_eq!(issue.feed, kp.feed_id(FeedFormat::Classic));
        assert_eq!(
            issue.kind,
            InconsistencyKind::Rejected(RejectReason::NotIncreasing { latest: 5, found: 3 })
        );
        assert_eq!(report.broken_positions, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(
            report.broken_feeds().into_iter().collect::<Vec<_>>(),
            vec![kp.feed_id(FeedFormat::Classic)]
        );
        assert_eq!(report.inconsistencies_of(&issue.feed).count(), 1);
    }

    #[tokio::test]
    async fn test_gap_reported() {
        let s = store();
        let msgs = chain(&Ed25519KeyPair::generate(), 4);
        for i in [0, 1, 3] {
            store_raw(&s, &msgs[i]).await;
        }

        let report = s.checker.check(FsckMode::Sequences, running()).await.unwrap();
        assert_eq!(report.inconsistencies.len(), 1);
        assert_eq!(report.inconsistencies[0].kind, InconsistencyKind::Gap);
        assert_eq!(report.inconsistencies[0].expected, 3);
        assert_eq!(report.inconsistencies[0].found, 4);
    }

    #[tokio::test]
    async fn test_length_mismatch_reported() {
        let s = store();
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, 3);
        for m in &msgs {
            store_raw(&s, m).await;
        }
        // Index entry pointing at the wrong message.
        s.index.sublog(&kp.feed_id(FeedFormat::Classic)).append(0).await.unwrap();

        let report = s.checker.check(FsckMode::Length, running()).await.unwrap();
        assert_eq!(report.inconsistencies.len(), 1);
        let issue = &report.inconsistencies[0];
        assert_eq!(issue.kind, InconsistencyKind::Length);
        assert_eq!((issue.expected, issue.found), (4, 1));
        assert_eq!(report.broken_positions, vec![0, 1, 2]);
    }

    /// Sub-log whose full scan fails after the first entry.
    struct UnreadableSublog(Arc<InMemoryLog<LogSeq>>);

    #[async_trait]
    impl AppendOnlyLog<LogSeq> for UnreadableSublog {
        async fn append(&self, value: LogSeq) -> Result<LogSeq, LogError> {
            self.0.append(value).await
        }

        async fn get(&self, seq: LogSeq) -> Result<LogSeq, LogError> {
            self.0.get(seq).await
        }

        async fn current_seq(&self) -> Result<Option<LogSeq>, LogError> {
            self.0.current_seq().await
        }

        fn query(&self, from: LogSeq, live: bool) -> LogStream<LogSeq> {
            self.0
                .query(from, live)
                .take(1)
                .chain(futures::stream::iter([Err(LogError::Backend("read failed".into()))]))
                .boxed()
        }
    }

    struct UnreadableIndex(Arc<InMemoryMultiLog>);

    #[async_trait]
    impl MultiLog for UnreadableIndex {
        async fn get(&self, feed: &FeedId) -> Result<Arc<dyn AppendOnlyLog<LogSeq>>, LogError> {
            Ok(Arc::new(UnreadableSublog(self.0.sublog(feed))))
        }

        async fn list(&self) -> Result<Vec<FeedId>, LogError> {
            self.0.list().await
        }
    }

    #[tokio::test]
    async fn test_index_read_errors_propagate() {
        let s = store();
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, 3);
        for m in &msgs {
            store_raw(&s, m).await;
        }
        s.index.sublog(&kp.feed_id(FeedFormat::Classic)).append(0).await.unwrap();
        s.log.append(msgs[1].clone()).await.unwrap();

        let checker = ConsistencyChecker::new(s.log.clone(), Arc::new(UnreadableIndex(s.index.clone())));
        let expected: Result<ConsistencyReport, FsckError> =
            Err(FsckError::Storage(LogError::Backend("read failed".into())));
        assert_eq!(checker.check(FsckMode::Length, running()).await, expected);
        assert_eq!(checker.check(FsckMode::Sequences, running()).await, expected);
    }

    #[tokio::test]
    async fn test_nulled_entries_skipped() {
        let s = store();
        let msgs = chain(&Ed25519KeyPair::generate(), 3);
        for m in &msgs {
            store_raw(&s, m).await;
        }
        s.log.null(2).unwrap();

        let report = s.checker.check_all(running()).await.unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.nulled_skipped, 2);
    }

    #[tokio::test]
    async fn test_cancelled_check_returns_error() {
        let s = store();
        for m in &chain(&Ed25519KeyPair::generate(), 2) {
            store_raw(&s, m).await;
        }
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert_eq!(
            s.checker.check(FsckMode::Sequences, rx.clone()).await,
            Err(FsckError::Cancelled)
        );
        assert_eq!(s.checker.check(FsckMode::Length, rx).await, Err(FsckError::Cancelled));
    }
}
