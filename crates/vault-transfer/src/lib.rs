//! # vault-transfer: Transfer Codec
//!
//! Moves a [`SignedEnvelope`](vault_vc::SignedEnvelope) across the optical
//! channel and back.
//!
//! - [`codec`]: envelope to transport string ([`encode()`]) and transport
//!   string to JSON object ([`decode()`]).
//! - [`qr`]: transport string to QR bitmap ([`render()`]) and bitmap to
//!   transport string ([`scan()`]).
//!
//! ## Round-Trip Invariant
//!
//! `decode_envelope(encode(e)) == e` for every envelope `e`. The transport
//! string is the JCS form of the whole envelope, so it is also stable:
//! encoding the same envelope twice yields the same QR code.

pub mod codec;
pub mod error;
pub mod qr;

pub use codec::{decode, decode_envelope, encode, Candidate};
pub use error::TransferError;
pub use qr::{render, render_png, render_text, scan, scan_bytes, ErrorCorrection, QrSettings};
