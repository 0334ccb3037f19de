//! # Trust Graph Subsystem (SSB-04)
//!
//! Decides whom to replicate.
//!
//! ```text
//! main log ─→ ContactScanner ─→ Arc<TrustGraph> snapshot
//!                                      │ hops(self, n), blocked_list(self)
//!                                      ↓
//! replicate/block calls ─→ ReplicationManager ─→ Arc<ReplicationSet> ─→ authorize(remote)
//!                                      ↑
//!              log growth (watch) ─ debounce ─┘
//! ```
//!
//! ## Invariants
//!
//! - `wanted` and `blocked` are disjoint; a blocked feed is never authorized.
//! - Readers only see fully built graph and want-list snapshots.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::{AuthorizationError, GraphError};
pub use domain::graph::TrustGraph;
pub use domain::replication::{
    ReplicationConfig, ReplicationSet, ReplicationState, DEFAULT_DEBOUNCE, DEFAULT_HOPS,
};
pub use ports::inbound::ReplicationApi;
pub use service::{ContactScanner, ReplicationManager};
