//! # Format Errors
//!
//! Terminal per-message rejections. None of these are retried.

use thiserror::Error;

/// Errors raised while decoding or verifying a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The bytes do not decode to a message of the expected format.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The signature does not verify against the author key.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// The message names an algorithm or format this node does not know.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl FormatError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FormatError::MalformedEnvelope(msg.into())
    }
}

impl From<ssb_01_canonical_json::CanonicalError> for FormatError {
    fn from(e: ssb_01_canonical_json::CanonicalError) -> Self {
        FormatError::MalformedEnvelope(e.to_string())
    }
}

impl From<minicbor::decode::Error> for FormatError {
    fn from(e: minicbor::decode::Error) -> Self {
        FormatError::MalformedEnvelope(format!("cbor decode: {e}"))
    }
}

impl From<minicbor::encode::Error<std::convert::Infallible>> for FormatError {
    fn from(e: minicbor::encode::Error<std::convert::Infallible>) -> Self {
        FormatError::MalformedEnvelope(format!("cbor encode: {e}"))
    }
}
