//! # Canonical Serialization
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes that are
//! signed, verified or placed on the optical channel.
//!
//! ## Security Invariant
//!
//! A signature is computed over serialized bytes, and the verifier
//! re-serializes the payload it decoded before checking. If two
//! serializations of the same payload could differ, every verification would
//! be a coin toss. `CanonicalBytes` has a private inner field and a single
//! constructor, so a signing path cannot accidentally use `serde_json::to_vec`
//! with insertion-ordered keys.
//!
//! ## Rules
//!
//! 1. **Reject floats.** Disclosure payloads carry strings only; a float
//!    appearing anywhere means the caller serialized the wrong type.
//! 2. **RFC 8785 output.** `serde_jcs` sorts object keys and uses compact
//!    separators, so the byte sequence is independent of struct field order.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructors are [`CanonicalBytes::new()`] and
///   [`CanonicalBytes::from_value()`].
/// - Object keys are sorted, separators are compact, output is UTF-8.
/// - No float appears in the value tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// float, or `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let checked = reject_floats(value)?;
        let s = serde_jcs::to_string(&checked)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The canonical form as text. JCS output is always valid UTF-8.
    pub fn as_str(&self) -> &str {
        // serde_jcs produced this from a `String`; the bytes were never mutated.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Consume into the canonical text.
    pub fn into_string(self) -> String {
        String::from_utf8(self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut checked = serde_json::Map::new();
            for (k, v) in map {
                checked.insert(k, reject_floats(v)?);
            }
            Ok(Value::Object(checked))
        }
        Value::Array(arr) => {
            let checked: Result<Vec<_>, _> = arr.into_iter().map(reject_floats).collect();
            Ok(Value::Array(checked?))
        }
    }
}
