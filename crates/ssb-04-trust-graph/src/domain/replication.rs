//! Want-list state and the authorization rule.

use std::collections::BTreeSet;
use std::time::Duration;

use shared_types::FeedId;

use super::errors::AuthorizationError;

/// Default quiescence interval before a recompute.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Default hop count.
pub const DEFAULT_HOPS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Follow distance to replicate from.
    pub hop_count: u32,
    /// Log quiescence required before a recompute.
    pub debounce: Duration,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            hop_count: DEFAULT_HOPS,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Immutable want-list snapshot read on every authorization check.
///
/// `wanted` and `blocked` are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationSet {
    wanted: BTreeSet<FeedId>,
    blocked: BTreeSet<FeedId>,
}

impl ReplicationSet {
    pub fn wanted(&self) -> &BTreeSet<FeedId> {
        &self.wanted
    }

    pub fn blocked(&self) -> &BTreeSet<FeedId> {
        &self.blocked
    }

    pub fn check(&self, remote: &FeedId) -> Result<(), AuthorizationError> {
        if self.blocked.contains(remote) {
            Err(AuthorizationError::Blocked(*remote))
        } else if self.wanted.contains(remote) {
            Ok(())
        } else {
            Err(AuthorizationError::NotWanted(*remote))
        }
    }

    pub fn authorize(&self, remote: &FeedId) -> bool {
        self.check(remote).is_ok()
    }
}

/// Sources the want-list is derived from.
#[derive(Debug, Clone, Default)]
pub struct ReplicationState {
    pub manual_wants: BTreeSet<FeedId>,
    pub manual_blocks: BTreeSet<FeedId>,
    /// Replaced on every recompute.
    pub hop_wants: BTreeSet<FeedId>,
    /// Replaced on every recompute.
    pub graph_blocks: BTreeSet<FeedId>,
}

impl ReplicationState {
    /// Blocks win over wants.
    pub fn snapshot(&self) -> ReplicationSet {
        let blocked: BTreeSet<FeedId> = self
            .manual_blocks
            .union(&self.graph_blocks)
            .copied()
            .collect();
        let wanted = self
            .manual_wants
            .union(&self.hop_wants)
            .filter(|id| !blocked.contains(*id))
            .copied()
            .collect();
        ReplicationSet { wanted, blocked }
    }
}
