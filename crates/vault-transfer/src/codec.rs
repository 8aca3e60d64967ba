//! # Envelope Codec
//!
//! The transport string is the JCS serialization of the whole envelope,
//! payload and signature together. Decoding is split in two steps so the
//! verifier can tell a garbled scan ([`decode()`], `MalformedPayload`) from a
//! well-formed JSON object of the wrong shape (structural check,
//! `InvalidSchema`).

use serde_json::{Map, Value};
use vault_core::CanonicalBytes;
use vault_vc::SignedEnvelope;

use crate::error::TransferError;

/// A decoded JSON object that has not yet passed the structural check.
pub type Candidate = Map<String, Value>;

/// Serialize an envelope to its transport string.
pub fn encode(envelope: &SignedEnvelope) -> Result<String, TransferError> {
    Ok(CanonicalBytes::new(envelope)?.into_string())
}

/// Parse a transport string into a JSON object.
///
/// Anything other than a JSON object, including valid JSON arrays or
/// scalars, is a `MalformedPayload`.
pub fn decode(raw: &str) -> Result<Candidate, TransferError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(TransferError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(TransferError::MalformedPayload(e.to_string())),
    }
}

/// [`decode()`] followed by the structural check.
pub fn decode_envelope(raw: &str) -> Result<SignedEnvelope, TransferError> {
    Ok(SignedEnvelope::from_json_object(decode(raw)?)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vault_core::{ActorId, CredentialId, Timestamp};
    use vault_vc::{build_credential_disclosure_at, Credential, Field, SchemaError};

    fn envelope() -> SignedEnvelope {
        let credential = Credential {
            id: CredentialId::new("c1").unwrap(),
            document_type: "Passport".to_string(),
            issuer: "Vault Issuer".to_string(),
            issuance_date: Timestamp::from_epoch_secs(0).unwrap(),
            ipfs_hash: String::new(),
            file_data_url: String::new(),
            fields: vec![Field::new("Name", "Alice"), Field::new("DOB", "2000-01-01")],
        };
        build_credential_disclosure_at(
            &credential,
            &BTreeSet::from(["Name".to_string()]),
            &ActorId::new("did:x:1").unwrap(),
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn encode_is_canonical_json() {
        let env = envelope();
        let raw = encode(&env).unwrap();
        assert!(raw.starts_with(r#"{"credentialId":"c1","documentType":"Passport","fields":"#));
        assert!(raw.ends_with(&format!(r#""signature":"{}","timestamp":"2026-01-15T12:00:00Z"}}"#, env.signature)));
        assert!(!raw.contains(' '));
    }

    #[test]
    fn encode_decode_round_trip() {
        let env = envelope();
        let back = decode_envelope(&encode(&env).unwrap()).unwrap();
        assert_eq!(back, env);
        assert!(back.verify_signature());
    }

    #[test]
    fn encode_is_stable() {
        let env = envelope();
        assert_eq!(encode(&env).unwrap(), encode(&env.clone()).unwrap());
    }

    #[test]
    fn non_json_is_malformed() {
        for raw in ["", "not json", "{\"a\":", "https://example.com"] {
            assert!(
                matches!(decode(raw), Err(TransferError::MalformedPayload(_))),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn non_object_json_is_malformed() {
        let err = decode("[1,2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(matches!(decode("42"), Err(TransferError::MalformedPayload(_))));
    }

    #[test]
    fn object_of_wrong_shape_is_invalid_schema() {
        let err = decode_envelope(r#"{"hello":"world"}"#).unwrap_err();
        assert!(matches!(
            err,
            TransferError::InvalidSchema(SchemaError::MissingField("signature"))
        ));
    }

    #[test]
    fn decode_accepts_non_canonical_whitespace() {
        let env = envelope();
        let pretty = serde_json::to_string_pretty(&env).unwrap();
        assert_eq!(decode_envelope(&pretty).unwrap(), env);
    }
}
