//! # vault-crypto: Signature Engine
//!
//! Computes and verifies the keyed digest that binds a disclosure payload to
//! the actor who shared it.
//!
//! ## Trust Model
//!
//! This is a shared-secret scheme, not public-key cryptography. The secret
//! is the holder's own actor identifier, which is also the `sharedBy` value
//! printed inside every payload. A verifier therefore needs nothing beyond the
//! payload itself, and equally, anyone who knows an actor identifier can
//! produce signatures that verify as that actor. The signature detects
//! tampering by third parties who do not know the identifier; it does not
//! prove authorship.
//!
//! Replacing the scheme with asymmetric signatures changes the wire format
//! and must keep the contract shape of [`verify()`]: message, signature,
//! claimed signer.
//!
//! ## Crate Policy
//!
//! - Depends only on `vault-core` internally.
//! - No mocking of digests in tests; every test runs real SHA-256.

pub mod error;
pub mod signature;

pub use error::CryptoError;
pub use signature::{sign, verify, Signature, SIGNATURE_HEX_LEN};
