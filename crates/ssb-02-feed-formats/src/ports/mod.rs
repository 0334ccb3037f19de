//! # Ports Layer
//!
//! - `inbound`: API consumed by the ingest path and the publisher

pub mod inbound;
