//! # Credentials
//!
//! A credential is the vault's record of one ingested document: the document
//! type and the ordered key/value fields extracted from it, plus opaque
//! pointers to the original image. Credentials are created once by
//! [`issue_credential()`](crate::analyzer::issue_credential) and never
//! mutated; the holder can only delete them.

use serde::{Deserialize, Serialize};
use vault_core::{CredentialId, Timestamp};

/// One disclosed datum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    /// Field name as printed on the document (e.g. `"Full Name"`).
    pub key: String,
    /// Field value.
    pub value: String,
}

impl Field {
    /// Create a field.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A document-derived credential held in the vault.
///
/// Field keys are expected to be unique within one credential, but this is
/// not enforced. Selecting a key that appears twice discloses both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Stable identifier, also used for revocation lookups.
    pub id: CredentialId,
    /// Human-readable document type (e.g. `"Passport"`).
    pub document_type: String,
    /// Display name of the issuing party.
    pub issuer: String,
    /// When the credential entered the vault.
    pub issuance_date: Timestamp,
    /// Content pointer to the source image. Opaque.
    pub ipfs_hash: String,
    /// The source image as a data URL. Opaque.
    pub file_data_url: String,
    /// Extracted fields, in document order.
    pub fields: Vec<Field>,
}

impl Credential {
    /// Look up the first field with the given key.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Whether any field carries the given key.
    pub fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Field keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passport() -> Credential {
        Credential {
            id: CredentialId::new("c1").unwrap(),
            document_type: "Passport".to_string(),
            issuer: "Vault Issuer".to_string(),
            issuance_date: Timestamp::from_epoch_secs(0).unwrap(),
            ipfs_hash: "ipfs://abc".to_string(),
            file_data_url: "data:image/png;base64,AA==".to_string(),
            fields: vec![Field::new("Name", "Alice"), Field::new("DOB", "2000-01-01")],
        }
    }

    #[test]
    fn field_lookup() {
        let c = passport();
        assert_eq!(c.field("DOB").map(|f| f.value.as_str()), Some("2000-01-01"));
        assert!(c.has_field("Name"));
        assert!(!c.has_field("Nationality"));
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["Name", "DOB"]);
    }

    #[test]
    fn serde_uses_camel_case_storage_keys() {
        let json = serde_json::to_value(passport()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["id", "documentType", "issuer", "issuanceDate", "ipfsHash", "fileDataUrl", "fields"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["issuanceDate"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn serde_round_trip() {
        let c = passport();
        let json = serde_json::to_string(&c).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn field_rejects_extra_members() {
        let result: Result<Field, _> =
            serde_json::from_str(r#"{"key":"Name","value":"Alice","hidden":"x"}"#);
        assert!(result.is_err());
    }
}
