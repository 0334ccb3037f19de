//! # Ports Layer
//!
//! - `inbound`: ingest and publish API used by replication streams
//! - `outbound`: abstract append-only log and per-feed index

pub mod inbound;
pub mod outbound;
