//! # Adapters
//!
//! In-memory implementations of the log ports.

pub mod memory;

pub use memory::{InMemoryLog, InMemoryMultiLog};
