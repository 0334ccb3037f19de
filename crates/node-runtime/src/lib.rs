//! # Node Runtime Library
//!
//! Wiring of the replication core: configuration, the subsystem container
//! and the runtime that owns background tasks. The binary entry point is
//! `main.rs`.

pub mod container;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use runtime::NodeRuntime;
