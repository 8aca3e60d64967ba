//! Errors from the transfer codec.

use thiserror::Error;
use vault_core::CanonicalizationError;
use vault_vc::SchemaError;

/// Errors when encoding, decoding, rendering or scanning.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The transport string is not a JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The JSON object is not a disclosure envelope.
    #[error("invalid payload schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// The encoded envelope does not fit the configured QR capacity.
    #[error("payload of {size} bytes does not fit a QR code of version {max_version} or lower")]
    PayloadTooLarge {
        /// Encoded payload size in bytes.
        size: usize,
        /// The configured version ceiling.
        max_version: i16,
    },

    /// No QR code could be read from the image.
    #[error("no QR code found in image")]
    NotFound,

    /// The image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(String),

    /// The envelope could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
