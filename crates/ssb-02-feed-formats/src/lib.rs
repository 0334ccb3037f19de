//! # Feed Formats Subsystem (SSB-02)
//!
//! Decodes untrusted bytes into a common [`Message`] view and verifies their
//! signatures, for the three wire formats:
//!
//! | Format | Envelope | Signature covers | Key |
//! |--------|----------|------------------|-----|
//! | classic | JSON | canonical JSON without `signature` | SHA-256 of V8 binary canonical JSON |
//! | gabby-grove | CBOR transfer | encoded event | SHA-256 of `[event, signature]` |
//! | bendy-butt | bencode | encoded payload, then content | SHA-256 of the message |
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): one module per format, `Message` sum type
//! - **Ports Layer** (`ports/`): `FormatCodecApi`
//! - **Service Layer** (`service.rs`): `FormatCodec`, dispatch by format tag
//!
//! ## Security Notes
//!
//! - With a network key configured, every signature covers the truncated
//!   HMAC-SHA-512 of the signed bytes, so messages from other networks fail
//!   verification.
//! - Decode and verify errors are terminal for that message.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::bencode::Bencode;
pub use domain::bendybutt::BendyButtMessage;
pub use domain::bfe::BfeValue;
pub use domain::classic::ClassicMessage;
pub use domain::content::{content_type, Contact, ContactState, CONTACT_TYPE};
pub use domain::errors::FormatError;
pub use domain::gabbygrove::{ContentType, GabbyGroveMessage};
pub use domain::message::{FeedMessage, Message};
pub use ports::inbound::FormatCodecApi;
pub use service::{CodecConfig, FormatCodec};
