//! Errors from the signature engine.

use thiserror::Error;

/// Error in cryptographic operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// A signature string was not 64 lowercase hex characters.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}
