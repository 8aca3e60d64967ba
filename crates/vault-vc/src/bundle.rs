//! # Bundles
//!
//! A bundle is a named selection of fields drawn from one or more
//! credentials. Fields are copied into the bundle, not referenced, so a
//! bundle stays displayable and shareable after its source credential is
//! deleted. Source credentials are validated only at assembly time.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vault_core::{BundleId, CredentialId};

use crate::credential::Credential;

/// A field annotated with the credential it was copied from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleField {
    /// Source credential.
    pub credential_id: CredentialId,
    /// Document type of the source credential.
    pub credential_type: String,
    /// Field name.
    pub key: String,
    /// Field value.
    pub value: String,
}

/// A named, holder-curated set of fields from one or more credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Stable identifier.
    pub id: BundleId,
    /// Display name, carried as `bundleName` in disclosures.
    pub name: String,
    /// Member fields, in selection order.
    pub fields: Vec<BundleField>,
}

/// One `(credential, key)` pick made while assembling a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelection {
    /// Credential to copy from.
    pub credential_id: CredentialId,
    /// Key of the field to copy.
    pub key: String,
}

impl FieldSelection {
    /// Create a selection.
    pub fn new(credential_id: CredentialId, key: impl Into<String>) -> Self {
        Self {
            credential_id,
            key: key.into(),
        }
    }
}

impl std::str::FromStr for FieldSelection {
    type Err = BundleError;

    /// Parse `<credentialId>:<key>`. The key may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, key) = s
            .split_once(':')
            .ok_or_else(|| BundleError::MalformedSelection(s.to_string()))?;
        if key.is_empty() {
            return Err(BundleError::MalformedSelection(s.to_string()));
        }
        let credential_id =
            CredentialId::new(id).map_err(|_| BundleError::MalformedSelection(s.to_string()))?;
        Ok(Self::new(credential_id, key))
    }
}

/// Errors when assembling a bundle.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BundleError {
    /// The bundle name is blank.
    #[error("bundle name must not be blank")]
    EmptyName,

    /// No fields were selected.
    #[error("a bundle needs at least one field")]
    EmptySelection,

    /// A selection names a credential that is not in the vault.
    #[error("credential {0} is not in the vault")]
    UnknownCredential(CredentialId),

    /// A selection names a key the credential does not have.
    #[error("credential {credential_id} has no field {key:?}")]
    UnknownField {
        /// The credential that was searched.
        credential_id: CredentialId,
        /// The missing key.
        key: String,
    },

    /// A textual selection was not `<credentialId>:<key>`.
    #[error("field selection must look like <credentialId>:<key>, got {0:?}")]
    MalformedSelection(String),
}

impl Bundle {
    /// Assemble a bundle from selections over the vault's credentials.
    ///
    /// Repeated selections collapse to the first occurrence. When a
    /// credential has several fields with the selected key, all of them are
    /// copied.
    pub fn assemble(
        name: &str,
        selections: &[FieldSelection],
        vault: &[Credential],
    ) -> Result<Self, BundleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BundleError::EmptyName);
        }
        if selections.is_empty() {
            return Err(BundleError::EmptySelection);
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for selection in selections {
            if !seen.insert(selection) {
                continue;
            }
            let credential = vault
                .iter()
                .find(|c| c.id == selection.credential_id)
                .ok_or_else(|| BundleError::UnknownCredential(selection.credential_id.clone()))?;

            let before = fields.len();
            fields.extend(
                credential
                    .fields
                    .iter()
                    .filter(|f| f.key == selection.key)
                    .map(|f| BundleField {
                        credential_id: credential.id.clone(),
                        credential_type: credential.document_type.clone(),
                        key: f.key.clone(),
                        value: f.value.clone(),
                    }),
            );
            if fields.len() == before {
                return Err(BundleError::UnknownField {
                    credential_id: credential.id.clone(),
                    key: selection.key.clone(),
                });
            }
        }

        Ok(Self {
            id: BundleId::generate(),
            name: name.to_string(),
            fields,
        })
    }

    /// Distinct source credentials of this bundle's fields.
    pub fn credential_ids(&self) -> BTreeSet<CredentialId> {
        self.fields.iter().map(|f| f.credential_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Field;
    use vault_core::Timestamp;

    fn credential(id: &str, doc: &str, fields: &[(&str, &str)]) -> Credential {
        Credential {
            id: CredentialId::new(id).unwrap(),
            document_type: doc.to_string(),
            issuer: "Vault Issuer".to_string(),
            issuance_date: Timestamp::from_epoch_secs(0).unwrap(),
            ipfs_hash: String::new(),
            file_data_url: String::new(),
            fields: fields.iter().map(|(k, v)| Field::new(*k, *v)).collect(),
        }
    }

    fn vault() -> Vec<Credential> {
        vec![
            credential("c1", "Passport", &[("Name", "Alice"), ("DOB", "2000-01-01")]),
            credential("c2", "Degree", &[("University", "Uni"), ("Year", "2022")]),
        ]
    }

    fn pick(id: &str, key: &str) -> FieldSelection {
        FieldSelection::new(CredentialId::new(id).unwrap(), key)
    }

    #[test]
    fn assemble_copies_fields_in_selection_order() {
        let bundle = Bundle::assemble(
            "Job application",
            &[pick("c2", "University"), pick("c1", "Name")],
            &vault(),
        )
        .unwrap();
        assert_eq!(bundle.name, "Job application");
        assert_eq!(bundle.fields.len(), 2);
        assert_eq!(bundle.fields[0].credential_type, "Degree");
        assert_eq!(bundle.fields[0].value, "Uni");
        assert_eq!(bundle.fields[1].credential_id.as_str(), "c1");
        assert_eq!(bundle.fields[1].value, "Alice");
    }

    #[test]
    fn assemble_trims_name() {
        let bundle = Bundle::assemble("  Trip  ", &[pick("c1", "Name")], &vault()).unwrap();
        assert_eq!(bundle.name, "Trip");
    }

    #[test]
    fn blank_name_rejected() {
        let err = Bundle::assemble("  ", &[pick("c1", "Name")], &vault()).unwrap_err();
        assert_eq!(err, BundleError::EmptyName);
    }

    #[test]
    fn empty_selection_rejected() {
        let err = Bundle::assemble("Trip", &[], &vault()).unwrap_err();
        assert_eq!(err, BundleError::EmptySelection);
    }

    #[test]
    fn unknown_credential_rejected() {
        let err = Bundle::assemble("Trip", &[pick("c9", "Name")], &vault()).unwrap_err();
        assert_eq!(err, BundleError::UnknownCredential(CredentialId::new("c9").unwrap()));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = Bundle::assemble("Trip", &[pick("c1", "Height")], &vault()).unwrap_err();
        assert!(matches!(err, BundleError::UnknownField { ref key, .. } if key == "Height"));
    }

    #[test]
    fn duplicate_selection_collapses() {
        let bundle =
            Bundle::assemble("Trip", &[pick("c1", "Name"), pick("c1", "Name")], &vault()).unwrap();
        assert_eq!(bundle.fields.len(), 1);
    }

    #[test]
    fn duplicate_keys_in_credential_all_copied() {
        let vault = vec![credential("c1", "Card", &[("Alias", "A"), ("Alias", "B")])];
        let bundle = Bundle::assemble("Aliases", &[pick("c1", "Alias")], &vault).unwrap();
        assert_eq!(bundle.fields.len(), 2);
    }

    #[test]
    fn credential_ids_are_distinct() {
        let bundle = Bundle::assemble(
            "Trip",
            &[pick("c1", "Name"), pick("c1", "DOB"), pick("c2", "Year")],
            &vault(),
        )
        .unwrap();
        let ids: Vec<_> = bundle.credential_ids().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[test]
    fn selection_parses_first_colon() {
        let s: FieldSelection = "c1:Note: extra".parse().unwrap();
        assert_eq!(s.credential_id.as_str(), "c1");
        assert_eq!(s.key, "Note: extra");
        assert!("c1".parse::<FieldSelection>().is_err());
        assert!("c1:".parse::<FieldSelection>().is_err());
        assert!(":Name".parse::<FieldSelection>().is_err());
    }

    #[test]
    fn bundle_field_serializes_wire_names() {
        let bundle = Bundle::assemble("Trip", &[pick("c1", "Name")], &vault()).unwrap();
        let json = serde_json::to_value(&bundle.fields[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "credentialId": "c1",
                "credentialType": "Passport",
                "key": "Name",
                "value": "Alice"
            })
        );
    }
}
