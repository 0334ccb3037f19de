//! # Consistency Report
//!
//! Aggregate result of one checker run. Built fresh on every run and never
//! persisted.

use std::collections::{BTreeMap, BTreeSet};

use shared_types::{FeedId, LogSeq, Sequence};
use ssb_02_feed_formats::Message;
use ssb_03_feed_validation::RejectReason;

/// Which check to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsckMode {
    /// Compare each feed index's length with the sequence it points at.
    Length,
    /// Replay the whole main log through the sequencing rule.
    Sequences,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconsistencyKind {
    /// The feed index holds a different number of entries than the sequence
    /// of the message its last entry points at.
    Length,
    /// A stored feed skips sequence numbers.
    Gap,
    /// The sequencing rule rejected a stored message.
    Rejected(RejectReason),
}

/// One offending message.
#[derive(Debug, Clone, PartialEq)]
pub struct Inconsistency {
    pub feed: FeedId,
    /// Main-log position of the offending message.
    pub log_seq: LogSeq,
    pub expected: Sequence,
    pub found: Sequence,
    pub kind: InconsistencyKind,
    pub message: Message,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsistencyReport {
    /// In log order.
    pub inconsistencies: Vec<Inconsistency>,
    /// Main-log positions of every message of a broken feed, ascending.
    pub broken_positions: Vec<LogSeq>,
    pub messages_checked: u64,
    pub feeds_checked: u64,
    pub nulled_skipped: u64,
    pub duration_ms: u64,
}

impl ConsistencyReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    /// Feeds with at least one inconsistency.
    pub fn broken_feeds(&self) -> BTreeSet<FeedId> {
        self.inconsistencies.iter().map(|i| i.feed).collect()
    }

    pub fn inconsistencies_of<'a>(
        &'a self,
        feed: &'a FeedId,
    ) -> impl Iterator<Item = &'a Inconsistency> + 'a {
        self.inconsistencies.iter().filter(move |i| &i.feed == feed)
    }

    pub fn add_inconsistency(&mut self, inconsistency: Inconsistency) {
        self.inconsistencies.push(inconsistency);
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ConsistencyReport) {
        self.inconsistencies.extend(other.inconsistencies);
        let positions: BTreeSet<LogSeq> = self
            .broken_positions
            .drain(..)
            .chain(other.broken_positions)
            .collect();
        self.broken_positions = positions.into_iter().collect();
        self.messages_checked += other.messages_checked;
        self.feeds_checked = self.feeds_checked.max(other.feeds_checked);
        self.nulled_skipped += other.nulled_skipped;
        self.duration_ms += other.duration_ms;
    }

    /// Record the positions of every broken feed.
    pub(crate) fn set_broken_positions(
        &mut self,
        positions: &BTreeMap<FeedId, Vec<LogSeq>>,
        broken: &BTreeSet<FeedId>,
    ) {
        let mut all: Vec<LogSeq> = broken
            .iter()
            .filter_map(|f| positions.get(f))
            .flatten()
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        self.broken_positions = all;
    }
}
