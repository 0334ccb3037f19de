//! # Canonicalization Errors
//!
//! Every failure of the canonical encoder is a `MalformedInput` carrying the
//! byte offset where parsing stopped and what went wrong there.

use thiserror::Error;

/// What made the input unacceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    /// The input is not valid UTF-8.
    InvalidUtf8,
    /// The input ended in the middle of a value.
    UnexpectedEnd,
    /// A character that cannot start or continue a value here.
    UnexpectedChar(char),
    /// The top-level value is not an object.
    NotAnObject,
    /// An object contains the same key twice.
    DuplicateKey(String),
    /// A number does not follow the JSON grammar (e.g. `01`, `1.`, `-`).
    InvalidNumber,
    /// A number literal overflows to infinity.
    NonFiniteNumber,
    /// A string is missing its closing quote.
    UnterminatedString,
    /// A raw control character (below 0x20) inside a string.
    ControlCharacter,
    /// An unknown `\x` escape or a malformed `\uXXXX`.
    InvalidEscape,
    /// Non-whitespace data after the top-level object.
    TrailingData,
    /// Nesting exceeds the configured depth.
    TooDeep,
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            SyntaxKind::UnexpectedEnd => write!(f, "unexpected end of input"),
            SyntaxKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            SyntaxKind::NotAnObject => write!(f, "top-level value is not an object"),
            SyntaxKind::DuplicateKey(k) => write!(f, "duplicate key {k:?}"),
            SyntaxKind::InvalidNumber => write!(f, "invalid number"),
            SyntaxKind::NonFiniteNumber => write!(f, "number is not finite"),
            SyntaxKind::UnterminatedString => write!(f, "unterminated string"),
            SyntaxKind::ControlCharacter => write!(f, "control character in string"),
            SyntaxKind::InvalidEscape => write!(f, "invalid escape sequence"),
            SyntaxKind::TrailingData => write!(f, "trailing data after object"),
            SyntaxKind::TooDeep => write!(f, "nesting too deep"),
        }
    }
}

/// Errors produced by the canonical encoder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonicalError {
    /// The input is not a single well-formed JSON object.
    #[error("Malformed input at byte {offset}: {kind}")]
    MalformedInput { offset: usize, kind: SyntaxKind },
}

impl CanonicalError {
    pub(crate) fn at(offset: usize, kind: SyntaxKind) -> Self {
        CanonicalError::MalformedInput { offset, kind }
    }

    /// The syntax problem behind this error.
    pub fn kind(&self) -> &SyntaxKind {
        match self {
            CanonicalError::MalformedInput { kind, .. } => kind,
        }
    }
}
