//! # Shared Crypto
//!
//! Cryptographic primitives used to sign and verify feed messages.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Message keys |
//! | `signatures` | Ed25519 | Feed authorship |
//! | `network_key` | HMAC-SHA-512/256 | Network partitioning |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency
//! - **NetworkKey**: Secret zeroized on drop, never printed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod network_key;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::sha256;
pub use network_key::NetworkKey;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
