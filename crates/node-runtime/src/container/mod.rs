//! # Subsystem Container
//!
//! Central container holding all core components with explicit dependency
//! injection. No component reaches for global state.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::SubsystemContainer;
