//! # Content Digest
//!
//! SHA-256 over opaque binary content, such as a scanned document image.
//! Signed payloads never come through here: their digest is keyed and lives
//! in `vault-crypto`.

use sha2::{Digest, Sha256};

/// A raw 32-byte SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Compute a SHA-256 digest of opaque binary content.
pub fn sha256_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest(Sha256::digest(data).into())
}
