//! # vault-core: Foundational Types for the Identity Vault
//!
//! Every other crate in the workspace depends on `vault-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that gets signed
//!    flows through `CanonicalBytes::new()`. The signer and the
//!    verifier serialize independently, so both sides must produce the same
//!    bytes for the same payload.
//!
//! 2. **Newtype identifiers.** `CredentialId`, `BundleId` and `ActorId` are
//!    distinct types with validated constructors. An `ActorId` doubles as a
//!    signing secret and never prints in full through `Debug`.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is always `Z`-suffixed with
//!    whole-second precision, and parsing accepts nothing else, so a
//!    timestamp inside a signed payload has exactly one serialized form.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vault-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, ContentDigest};
pub use error::{CanonicalizationError, VaultError};
pub use identity::{ActorId, BundleId, CredentialId};
pub use temporal::Timestamp;
