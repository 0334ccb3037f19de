//! # Ports Layer
//!
//! - `inbound`: want-list API used by the connection gate and operators

pub mod inbound;
