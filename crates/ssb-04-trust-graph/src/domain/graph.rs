//! # Trust Graph
//!
//! Directed follow and block edges derived from contact messages. The graph
//! is a rebuildable projection of the log, never authoritative state.
//!
//! Each `(from, to)` pair keeps only the state declared by the contact
//! message with the highest sequence in `from`'s feed.

use std::collections::{BTreeSet, HashMap};

use shared_types::{FeedId, Sequence};
use ssb_02_feed_formats::{Contact, ContactState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    state: ContactState,
    sequence: Sequence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustGraph {
    edges: HashMap<FeedId, HashMap<FeedId, Edge>>,
}

impl TrustGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contact published at `sequence` of its author's feed.
    ///
    /// Returns whether the graph changed. Contacts older than the recorded
    /// edge are ignored.
    pub fn apply(&mut self, contact: &Contact, sequence: Sequence) -> bool {
        let targets = self.edges.entry(contact.from).or_default();
        let edge = Edge {
            state: contact.state(),
            sequence,
        };
        match targets.get(&contact.contact) {
            Some(existing) if existing.sequence >= sequence => false,
            Some(existing) if existing.state == edge.state => {
                targets.insert(contact.contact, edge);
                false
            }
            _ => {
                targets.insert(contact.contact, edge);
                true
            }
        }
    }

    fn state(&self, a: &FeedId, b: &FeedId) -> Option<ContactState> {
        self.edges.get(a)?.get(b).map(|e| e.state)
    }

    pub fn follows(&self, a: &FeedId, b: &FeedId) -> bool {
        self.state(a, b) == Some(ContactState::Follow)
    }

    pub fn blocked(&self, a: &FeedId, b: &FeedId) -> bool {
        self.state(a, b) == Some(ContactState::Block)
    }

    fn with_state(&self, a: &FeedId, state: ContactState) -> BTreeSet<FeedId> {
        self.edges
            .get(a)
            .into_iter()
            .flatten()
            .filter(|(_, e)| e.state == state)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Feeds `a` directly follows.
    pub fn follows_of(&self, a: &FeedId) -> BTreeSet<FeedId> {
        self.with_state(a, ContactState::Follow)
    }

    /// Feeds `a` directly blocks.
    pub fn blocked_list(&self, a: &FeedId) -> BTreeSet<FeedId> {
        self.with_state(a, ContactState::Block)
    }

    /// Feeds reachable from `start` in at most `max_hops` follow steps.
    ///
    /// A feed blocked by `start` or by any feed of the frontier being
    /// expanded is not added at that level and is never expanded through.
    /// Feeds accepted at earlier levels stay. `start` itself is excluded.
    pub fn hops(&self, start: &FeedId, max_hops: u32) -> BTreeSet<FeedId> {
        let mut reached = BTreeSet::new();
        let mut frontier = vec![*start];

        for _ in 0..max_hops {
            if frontier.is_empty() {
                break;
            }
            let is_blocked = |candidate: &FeedId| {
                self.blocked(start, candidate) || frontier.iter().any(|f| self.blocked(f, candidate))
            };

            let mut next = Vec::new();
            for from in &frontier {
                for to in self.follows_of(from) {
                    if to == *start || reached.contains(&to) || is_blocked(&to) {
                        continue;
                    }
                    reached.insert(to);
                    next.push(to);
                }
            }
            frontier = next;
        }
        reached
    }

    /// Number of feeds with at least one recorded edge.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::FeedFormat;

    fn feed(n: u8) -> FeedId {
        FeedId::new([n; 32], FeedFormat::Classic)
    }

    fn contact(from: u8, to: u8, following: Option<bool>, blocking: Option<bool>) -> Contact {
        Contact {
            from: feed(from),
            contact: feed(to),
            following,
            blocking,
        }
    }

    fn follow(g: &mut TrustGraph, from: u8, to: u8, seq: Sequence) {
        g.apply(&contact(from, to, Some(true), None), seq);
    }

    fn block(g: &mut TrustGraph, from: u8, to: u8, seq: Sequence) {
        g.apply(&contact(from, to, Some(false), Some(true)), seq);
    }

    #[test]
    fn test_last_writer_by_sequence() {
        let mut g = TrustGraph::new();
        follow(&mut g, 1, 2, 5);
        assert!(g.follows(&feed(1), &feed(2)));

        block(&mut g, 1, 2, 3);
        assert!(g.follows(&feed(1), &feed(2)));

        block(&mut g, 1, 2, 6);
        assert!(g.blocked(&feed(1), &feed(2)));
        assert!(!g.follows(&feed(1), &feed(2)));

        assert!(g.apply(&contact(1, 2, None, None), 7));
        assert!(!g.blocked(&feed(1), &feed(2)));
        assert!(g.blocked_list(&feed(1)).is_empty());
    }

    #[test]
    fn test_apply_reports_change() {
        let mut g = TrustGraph::new();
        assert!(g.apply(&contact(1, 2, Some(true), None), 1));
        assert!(!g.apply(&contact(1, 2, Some(true), None), 2));
        assert!(!g.apply(&contact(1, 2, Some(false), None), 1));
    }

    #[test]
    fn test_hops_levels() {
        let mut g = TrustGraph::new();
        follow(&mut g, 1, 2, 1);
        follow(&mut g, 2, 3, 1);
        follow(&mut g, 3, 4, 1);
        follow(&mut g, 3, 1, 2);

        assert!(g.hops(&feed(1), 0).is_empty());
        assert_eq!(g.hops(&feed(1), 1), g.follows_of(&feed(1)));
        assert_eq!(g.hops(&feed(1), 2), [feed(2), feed(3)].into());
        assert_eq!(g.hops(&feed(1), 5), [feed(2), feed(3), feed(4)].into());
    }

    #[test]
    fn test_block_stops_expansion_not_history() {
        let mut g = TrustGraph::new();
        follow(&mut g, 1, 2, 1);
        follow(&mut g, 2, 3, 1);
        follow(&mut g, 3, 4, 1);
        follow(&mut g, 2, 5, 2);
        block(&mut g, 1, 3, 2);
        block(&mut g, 5, 2, 1);

        let reached = g.hops(&feed(1), 3);
        assert!(reached.contains(&feed(2)));
        assert!(reached.contains(&feed(5)));
        assert!(!reached.contains(&feed(3)));
        assert!(!reached.contains(&feed(4)));
    }

    #[test]
    fn test_frontier_block_excludes_candidate() {
        let mut g = TrustGraph::new();
        follow(&mut g, 1, 2, 1);
        follow(&mut g, 1, 3, 2);
        follow(&mut g, 2, 4, 1);
        block(&mut g, 3, 4, 1);

        assert!(!g.hops(&feed(1), 2).contains(&feed(4)));
    }

    fn arb_graph() -> impl Strategy<Value = TrustGraph> {
        prop::collection::vec((0u8..8, 0u8..8, any::<bool>()), 0..40).prop_map(|edges| {
            let mut g = TrustGraph::new();
            for (i, (from, to, is_follow)) in edges.into_iter().enumerate() {
                if from == to {
                    continue;
                }
                let seq = i as Sequence + 1;
                if is_follow {
                    follow(&mut g, from, to, seq);
                } else {
                    block(&mut g, from, to, seq);
                }
            }
            g
        })
    }

    proptest! {
        #[test]
        fn prop_hops_monotonic(g in arb_graph(), start in 0u8..8, n in 0u32..6) {
            let smaller = g.hops(&feed(start), n);
            let larger = g.hops(&feed(start), n + 1);
            prop_assert!(smaller.is_subset(&larger));
            prop_assert!(!larger.contains(&feed(start)));
        }

        #[test]
        fn prop_one_hop_is_direct_follows(g in arb_graph(), start in 0u8..8) {
            let one = g.hops(&feed(start), 1);
            let direct: BTreeSet<FeedId> = g
                .follows_of(&feed(start))
                .into_iter()
                .filter(|f| !g.blocked(&feed(start), f))
                .collect();
            prop_assert_eq!(one, direct);
        }
    }
}
