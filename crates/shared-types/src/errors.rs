//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors produced while parsing or constructing references.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefError {
    /// The reference does not start with the expected sigil.
    #[error("Invalid sigil: expected '{expected}' in {input:?}")]
    InvalidSigil { expected: char, input: String },

    /// No `.suffix` part was found.
    #[error("Missing algorithm suffix in {0:?}")]
    MissingSuffix(String),

    /// The algorithm suffix is not one of the supported tags.
    #[error("Unknown algorithm suffix: {0}")]
    UnknownAlgo(String),

    /// The key or hash payload is not valid base64.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// The decoded payload has the wrong length.
    #[error("Invalid payload length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
