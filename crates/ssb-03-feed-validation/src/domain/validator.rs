//! # Feed Validator
//!
//! The transition deciding whether a candidate is the valid next message of
//! a feed. It is a pure function of the prior state and the candidate so the
//! online ingest path and the offline consistency checker apply exactly the
//! same rule.
//!
//! ```text
//! Empty ── seq 1 ──→ HasLatest(1) ── seq n+1, previous == key(n) ──→ HasLatest(n+1)
//!                         │
//!                         ├── seq > n+1 ──→ Skip (gap, state unchanged)
//!                         └── seq <= n, wrong previous, wrong author ──→ Reject
//! ```

use shared_types::{FeedId, MessageRef, Sequence};
use ssb_02_feed_formats::FeedMessage;
use thiserror::Error;

/// Latest accepted position of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedState {
    pub author: FeedId,
    pub sequence: Sequence,
    pub key: MessageRef,
}

impl FeedState {
    pub fn of<M: FeedMessage + ?Sized>(msg: &M) -> Self {
        Self {
            author: *msg.author(),
            sequence: msg.sequence(),
            key: *msg.key(),
        }
    }
}

/// Validator state of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatorState {
    /// No message accepted yet.
    #[default]
    Empty,
    HasLatest(FeedState),
}

impl ValidatorState {
    pub fn latest(&self) -> Option<&FeedState> {
        match self {
            ValidatorState::Empty => None,
            ValidatorState::HasLatest(s) => Some(s),
        }
    }

    pub fn sequence(&self) -> Sequence {
        self.latest().map_or(0, |s| s.sequence)
    }

    /// Apply a candidate the validator accepted.
    pub fn advance<M: FeedMessage + ?Sized>(&mut self, msg: &M) {
        *self = ValidatorState::HasLatest(FeedState::of(msg));
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("first message must be sequence 1, got {found}")]
    FirstNotOne { found: Sequence },

    #[error("wrong author: expected {expected}, got {found}")]
    WrongAuthor { expected: FeedId, found: FeedId },

    #[error("previous hash mismatch at sequence {sequence}")]
    PreviousMismatch { sequence: Sequence },

    #[error("sequence not increasing: latest {latest}, got {found}")]
    NotIncreasing { latest: Sequence, found: Sequence },
}

/// Outcome of [`validate_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    /// The candidate lies beyond a gap. Not appended, not an error.
    Skip { latest: Sequence, found: Sequence },
    Reject(RejectReason),
}

/// Decide whether `candidate` is the next message after `state`.
pub fn validate_next<M: FeedMessage + ?Sized>(state: &ValidatorState, candidate: &M) -> Decision {
    let latest = match state {
        ValidatorState::Empty => {
            return match (candidate.sequence(), candidate.previous()) {
                (1, None) => Decision::Accepted,
                (1, Some(_)) => Decision::Reject(RejectReason::PreviousMismatch { sequence: 1 }),
                (found, _) => Decision::Reject(RejectReason::FirstNotOne { found }),
            };
        }
        ValidatorState::HasLatest(latest) => latest,
    };

    if candidate.author() != &latest.author {
        return Decision::Reject(RejectReason::WrongAuthor {
            expected: latest.author,
            found: *candidate.author(),
        });
    }

    let found = candidate.sequence();
    match found.checked_sub(latest.sequence) {
        Some(1) if candidate.previous() == Some(&latest.key) => Decision::Accepted,
        Some(1) => Decision::Reject(RejectReason::PreviousMismatch { sequence: found }),
        Some(0) | None => Decision::Reject(RejectReason::NotIncreasing {
            latest: latest.sequence,
            found,
        }),
        Some(_) => Decision::Skip {
            latest: latest.sequence,
            found,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use shared_crypto::Ed25519KeyPair;
    use shared_types::FeedFormat;
    use ssb_02_feed_formats::{FormatCodec, FormatCodecApi, Message};

    fn chain(kp: &Ed25519KeyPair, format: FeedFormat, n: u64) -> Vec<Message> {
        let codec = FormatCodec::default();
        let mut out: Vec<Message> = Vec::new();
        for seq in 1..=n {
            let previous = out.last().map(|m| *m.key());
            let msg = codec
                .create(kp, format, previous.as_ref(), seq, seq as i64, &json!({"type": "test", "n": seq}))
                .unwrap();
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_empty_accepts_only_first() {
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, FeedFormat::Classic, 2);

        assert_eq!(validate_next(&ValidatorState::Empty, &msgs[0]), Decision::Accepted);
        assert_eq!(
            validate_next(&ValidatorState::Empty, &msgs[1]),
            Decision::Reject(RejectReason::FirstNotOne { found: 2 })
        );
    }

    #[test]
    fn test_gap_is_skipped() {
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, FeedFormat::Classic, 4);
        let mut state = ValidatorState::Empty;
        state.advance(&msgs[0]);

        assert_eq!(
            validate_next(&state, &msgs[3]),
            Decision::Skip { latest: 1, found: 4 }
        );
    }

    #[test]
    fn test_duplicate_and_regression_rejected() {
        let kp = Ed25519KeyPair::generate();
        let msgs = chain(&kp, FeedFormat::GabbyGrove, 3);
        let mut state = ValidatorState::Empty;
        for m in &msgs {
            state.advance(m);
        }

        assert!(matches!(
            validate_next(&state, &msgs[2]),
            Decision::Reject(RejectReason::NotIncreasing { latest: 3, found: 3 })
        ));
        assert!(matches!(
            validate_next(&state, &msgs[0]),
            Decision::Reject(RejectReason::NotIncreasing { .. })
        ));
    }

    #[test]
    fn test_fork_rejected() {
        let kp = Ed25519KeyPair::generate();
        let main = chain(&kp, FeedFormat::Classic, 2);
        let codec = FormatCodec::default();
        let other_first = codec
            .create(&kp, FeedFormat::Classic, None, 1, 99, &json!({"type": "fork"}))
            .unwrap();
        let forked_second = codec
            .create(&kp, FeedFormat::Classic, Some(other_first.key()), 2, 100, &json!({"type": "fork"}))
            .unwrap();

        let mut state = ValidatorState::Empty;
        state.advance(&main[0]);
        assert_eq!(
            validate_next(&state, &forked_second),
            Decision::Reject(RejectReason::PreviousMismatch { sequence: 2 })
        );
        assert_eq!(validate_next(&state, &main[1]), Decision::Accepted);
    }

    #[test]
    fn test_wrong_author_rejected() {
        let a = chain(&Ed25519KeyPair::generate(), FeedFormat::Classic, 2);
        let b = chain(&Ed25519KeyPair::generate(), FeedFormat::Classic, 2);
        let mut state = ValidatorState::Empty;
        state.advance(&a[0]);

        assert!(matches!(
            validate_next(&state, &b[1]),
            Decision::Reject(RejectReason::WrongAuthor { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_valid_chain_fully_accepted(n in 1u64..12, format_idx in 0usize..3) {
            let format = [FeedFormat::Classic, FeedFormat::GabbyGrove, FeedFormat::BendyButt][format_idx];
            let kp = Ed25519KeyPair::generate();
            let msgs = chain(&kp, format, n);

            let mut state = ValidatorState::Empty;
            for m in &msgs {
                prop_assert_eq!(validate_next(&state, m), Decision::Accepted);
                state.advance(m);
            }
            prop_assert_eq!(state.sequence(), n);
        }

        #[test]
        fn prop_replayed_message_never_accepted(n in 2u64..10, pick in 0usize..10) {
            let kp = Ed25519KeyPair::generate();
            let msgs = chain(&kp, FeedFormat::Classic, n);
            let mut state = ValidatorState::Empty;
            for m in &msgs {
                state.advance(m);
            }

            let replay = &msgs[pick % msgs.len()];
            prop_assert!(matches!(validate_next(&state, replay), Decision::Reject(_)));
        }
    }
}
