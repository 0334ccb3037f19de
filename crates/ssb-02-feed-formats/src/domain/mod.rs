//! # Domain Layer
//!
//! One module per wire format plus the shared message view. Pure logic, no
//! I/O.

pub mod bencode;
pub mod bendybutt;
pub mod bfe;
pub mod classic;
pub mod content;
pub mod errors;
pub mod gabbygrove;
pub mod message;
