//! # Inbound Ports (Driving Ports / API)
//!
//! The canonicalization API consumed by the classic format codec.

use crate::domain::errors::CanonicalError;
use crate::domain::value::JsonObject;

/// Canonical encoder API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait CanonicalEncoderApi: Send + Sync {
    /// Re-serialize a JSON object in canonical form.
    ///
    /// Fails with `MalformedInput` unless `raw` is exactly one well-formed
    /// JSON object.
    fn canonicalize(&self, raw: &[u8]) -> Result<Vec<u8>, CanonicalError>;

    /// Parse a JSON object keeping key order, for callers that need to
    /// inspect or edit fields before printing.
    fn parse_object(&self, raw: &[u8]) -> Result<JsonObject, CanonicalError>;

    /// The byte-halving transform applied before hashing.
    fn internal_v8_binary(&self, canonical: &[u8]) -> Vec<u8>;
}
