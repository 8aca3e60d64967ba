//! # Keyed Digest Signatures
//!
//! `sign(message, secret) = lowercase_hex(SHA-256(message || secret))`.
//!
//! The construction is deterministic: no nonce and no clock input. Timestamps
//! belong inside the message, never inside the derivation, so the same
//! `(message, secret)` pair signs identically in every process.
//!
//! ## Security Invariant
//!
//! Verification recomputes the digest and compares the 32 raw bytes with
//! [`subtle::ConstantTimeEq`]. A signature that is not exactly 64 lowercase
//! hex characters never verifies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use vault_core::ActorId;

use crate::error::CryptoError;

/// Length of a signature in its hex wire form.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// A 32-byte keyed digest. Serializes as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature([u8; 32]);

impl Signature {
    /// Render as lowercase hex, the form carried in the `signature` field.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the wire form. Uppercase hex is rejected: the wire form is
    /// compared for exact equality, and `ABC` is not `abc`.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        if s.len() != SIGNATURE_HEX_LEN {
            return Err(CryptoError::MalformedSignature(format!(
                "expected {SIGNATURE_HEX_LEN} hex chars, got {}",
                s.len()
            )));
        }
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(CryptoError::MalformedSignature(
                "signature hex must be lowercase".to_string(),
            ));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Sign `message` with the actor identifier as the shared secret.
///
/// Disclosure payloads pass `&CanonicalBytes` here; any byte slice is
/// accepted so that tamper checks can run over arbitrary mutations.
pub fn sign(message: impl AsRef<[u8]>, secret: &ActorId) -> Signature {
    let hash = Sha256::new()
        .chain_update(message.as_ref())
        .chain_update(secret.secret_bytes())
        .finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Signature(bytes)
}

/// Verify `signature` over `message` for the claimed signer.
pub fn verify(message: impl AsRef<[u8]>, signature: &Signature, claimed_signer: &ActorId) -> bool {
    let expected = sign(message, claimed_signer);
    bool::from(expected.0.ct_eq(&signature.0))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_actor() -> impl Strategy<Value = ActorId> {
        "did:[a-z]{1,8}:[a-zA-Z0-9]{1,24}".prop_map(|s| ActorId::new(s).unwrap())
    }

    proptest! {
        #[test]
        fn sign_then_verify_round_trips(
            message in prop::collection::vec(any::<u8>(), 0..512),
            secret in any_actor(),
        ) {
            let sig = sign(&message, &secret);
            prop_assert!(verify(&message, &sig, &secret));
        }

        #[test]
        fn any_single_byte_mutation_fails(
            message in prop::collection::vec(any::<u8>(), 1..512),
            secret in any_actor(),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let sig = sign(&message, &secret);
            let mut mutated = message.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;
            prop_assert!(!verify(&mutated, &sig, &secret));
        }
    }
}
