//! # Domain Layer
//!
//! - `graph`: follow/block edges and hop-limited reachability
//! - `replication`: wanted/blocked sets and the authorization rule
//! - `errors`: graph and authorization errors

pub mod errors;
pub mod graph;
pub mod replication;
