//! # Canonical JSON Subsystem (SSB-01)
//!
//! Deterministic re-serialization of JSON message bodies. Both the signature
//! and the content hash of a classic message are computed over this form, not
//! over the bytes received from a peer.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): strict parser, printer, V8 byte transform
//! - **Ports Layer** (`ports/`): the `CanonicalEncoderApi` trait
//! - **Service Layer** (`service.rs`): `CanonicalEncoder`
//!
//! ## Compatibility Notes
//!
//! - Output matches `JSON.stringify(value, null, 2)` of the reference engine
//!   byte for byte, including number formatting and string escaping.
//! - `internal_v8_binary` reproduces a historical encoding quirk; changing it
//!   changes every message key on the network.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::{CanonicalError, SyntaxKind};
pub use domain::parser::{parse_object, parse_value, DEFAULT_MAX_DEPTH};
pub use domain::printer::format_number;
pub use domain::v8::internal_v8_binary;
pub use domain::value::{JsonObject, JsonString, JsonValue};
pub use ports::inbound::CanonicalEncoderApi;
pub use service::CanonicalEncoder;

/// Canonicalize with the default encoder.
pub fn canonicalize(raw: &[u8]) -> Result<Vec<u8>, CanonicalError> {
    CanonicalEncoder::new().canonicalize(raw)
}
