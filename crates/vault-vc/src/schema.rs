//! # Structural Check
//!
//! Turns a decoded JSON object into a typed [`SignedEnvelope`], deciding the
//! disclosure variant exactly once.
//!
//! Rules, in order:
//!
//! 1. `signature` is present and is 64 lowercase hex characters.
//! 2. `sharedBy` is present and is a string.
//! 3. `fields` is present and is an array.
//! 4. `timestamp` is present and is a string.
//! 5. Exactly one of {`documentType` or `credentialId`} and {`bundleName`}
//!    is present. Neither or both is ambiguous.
//! 6. The remaining members deserialize into that variant, with no unknown
//!    members. Rejecting unknown members keeps the typed payload lossless:
//!    re-serializing it for signature verification yields exactly what was
//!    received, minus `signature`.

use serde_json::{Map, Value};
use thiserror::Error;
use vault_crypto::Signature;

use crate::disclosure::{BundleDisclosure, DisclosurePayload, SignedEnvelope, SingleDisclosure};

/// Why a decoded object is not a disclosure envelope.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// A required member is absent.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// A required member has the wrong JSON type.
    #[error("field `{field}` must be {expected}")]
    WrongType {
        /// Member name.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// The object carries both or neither of the variant discriminants.
    #[error("payload must carry exactly one of documentType/credentialId or bundleName")]
    AmbiguousKind,

    /// The signature member is not a well-formed digest.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The members do not match the selected variant.
    #[error("payload shape rejected: {0}")]
    Shape(String),
}

impl SignedEnvelope {
    /// Run the structural check over a decoded JSON object.
    pub fn from_json_object(mut object: Map<String, Value>) -> Result<Self, SchemaError> {
        let signature = match object.remove("signature") {
            None => return Err(SchemaError::MissingField("signature")),
            Some(Value::String(s)) => {
                Signature::from_hex(&s).map_err(|e| SchemaError::MalformedSignature(e.to_string()))?
            }
            Some(_) => {
                return Err(SchemaError::WrongType {
                    field: "signature",
                    expected: "a string",
                })
            }
        };

        require(&object, "sharedBy", Value::is_string, "a string")?;
        require(&object, "fields", Value::is_array, "an array")?;
        require(&object, "timestamp", Value::is_string, "a string")?;

        let single = object.contains_key("documentType") || object.contains_key("credentialId");
        let bundle = object.contains_key("bundleName");
        let payload = match (single, bundle) {
            (true, false) => DisclosurePayload::Single(
                serde_json::from_value::<SingleDisclosure>(Value::Object(object))
                    .map_err(|e| SchemaError::Shape(e.to_string()))?,
            ),
            (false, true) => DisclosurePayload::Bundle(
                serde_json::from_value::<BundleDisclosure>(Value::Object(object))
                    .map_err(|e| SchemaError::Shape(e.to_string()))?,
            ),
            _ => return Err(SchemaError::AmbiguousKind),
        };

        Ok(Self { payload, signature })
    }
}

fn require(
    object: &Map<String, Value>,
    field: &'static str,
    check: fn(&Value) -> bool,
    expected: &'static str,
) -> Result<(), SchemaError> {
    match object.get(field) {
        None => Err(SchemaError::MissingField(field)),
        Some(v) if check(v) => Ok(()),
        Some(_) => Err(SchemaError::WrongType { field, expected }),
    }
}
