//! # Error Types
//!
//! Errors shared by every crate in the workspace. Crates with their own
//! concerns (disclosure, transfer, verification) define narrower enums and
//! convert into these only where a value crosses a crate boundary.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier was blank or otherwise unusable.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A value did not match its expected shape.
    #[error("schema validation error: {0}")]
    SchemaValidation(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values have more than one JCS rendering across implementations
    /// and are not permitted in signed payloads.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
