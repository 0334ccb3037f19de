//! # Network Key
//!
//! Optional 32-byte secret that partitions networks. When configured, the
//! bytes a feed signs are first authenticated with HMAC-SHA-512 under this
//! key and truncated to 32 bytes, and the signature covers that tag instead
//! of the raw bytes. Nodes on different networks cannot verify each other's
//! messages.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::CryptoError;

type HmacSha512 = Hmac<Sha512>;

/// Length of the authenticator produced by [`NetworkKey::auth`].
pub const AUTH_TAG_LEN: usize = 32;

/// Shared network secret.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkKey([u8; 32]);

impl NetworkKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string (64 hex chars).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: 32, actual: len })?;
        Ok(Self(arr))
    }

    /// Truncated HMAC-SHA-512 of `data`.
    pub fn auth(&self, data: &[u8]) -> Result<[u8; AUTH_TAG_LEN], CryptoError> {
        let mut mac = HmacSha512::new_from_slice(&self.0)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        mac.update(data);
        let full = mac.finalize().into_bytes();
        let mut out = [0u8; AUTH_TAG_LEN];
        out.copy_from_slice(&full[..AUTH_TAG_LEN]);
        Ok(out)
    }
}

impl std::fmt::Debug for NetworkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NetworkKey(..)")
    }
}

impl Drop for NetworkKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
