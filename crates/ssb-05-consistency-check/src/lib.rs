//! # Consistency Check Subsystem (SSB-05)
//!
//! Offline FSCK over the persisted log.
//!
//! | Mode | Reads | Flags |
//! |------|-------|-------|
//! | `Length` | every feed index | index length != sequence of the message it points at |
//! | `Sequences` | the whole main log in order | every message the sequencing rule would refuse, and gaps |
//!
//! Once a feed is flagged in sequence mode, the rest of its messages are
//! treated as broken. Nulled entries are skipped. Nothing is repaired.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::FsckError;
pub use domain::report::{ConsistencyReport, FsckMode, Inconsistency, InconsistencyKind};
pub use ports::inbound::ConsistencyCheckApi;
pub use service::ConsistencyChecker;
