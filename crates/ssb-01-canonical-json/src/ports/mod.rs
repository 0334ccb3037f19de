//! # Ports Layer
//!
//! - `inbound`: API this subsystem exposes to format codecs

pub mod inbound;
