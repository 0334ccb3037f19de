//! # Shared Types Crate
//!
//! Identity and addressing types shared by every subsystem of the node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: feed identities and message references are
//!   defined once here and nowhere else.
//! - **Format-tagged identity**: a `FeedId` always carries its wire format, and
//!   a `MessageRef` always carries its hash algorithm, so no component has to
//!   guess how to decode or verify.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
