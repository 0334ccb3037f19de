//! # Service Layer
//!
//! - `scanner`: contact scanner publishing trust-graph snapshots
//! - `manager`: want-list owner and debounced recompute task

pub mod manager;
pub mod scanner;

pub use manager::ReplicationManager;
pub use scanner::ContactScanner;
