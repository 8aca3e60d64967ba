//! # Selective Disclosure
//!
//! Builds the signed envelopes that leave the vault.
//!
//! A disclosure is one of two shapes, modelled as [`DisclosurePayload`]:
//!
//! - [`SingleDisclosure`]: a subset of one credential's fields, carrying
//!   `credentialId` and `documentType`.
//! - [`BundleDisclosure`]: every field of a bundle, carrying `bundleName`.
//!
//! ## Security Invariant
//!
//! `envelope.signature == sign(CanonicalBytes(payload), sharedBy)`. The
//! signing input is the JCS form of the payload alone; the signature is never
//! part of what it signs. [`SignedEnvelope::verify_signature()`] recomputes
//! exactly this, independently of how the envelope was obtained.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vault_core::{ActorId, CanonicalBytes, CanonicalizationError, CredentialId, Timestamp};
use vault_crypto::Signature;

use crate::bundle::{Bundle, BundleField};
use crate::credential::{Credential, Field};

/// Errors when building a disclosure.
#[derive(Error, Debug)]
pub enum DisclosureError {
    /// The selection matched no fields. Nothing would be disclosed.
    #[error("no fields selected for disclosure")]
    EmptySelection,

    /// The payload could not be canonicalized for signing.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Selected fields of a single credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SingleDisclosure {
    /// Source credential, checked against the revocation registry.
    pub credential_id: CredentialId,
    /// Document type of the source credential.
    pub document_type: String,
    /// The actor who shared, and signed, this disclosure.
    pub shared_by: ActorId,
    /// When the disclosure was built.
    pub timestamp: Timestamp,
    /// Disclosed fields, in the credential's order.
    pub fields: Vec<Field>,
}

/// All fields of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleDisclosure {
    /// Bundle display name.
    pub bundle_name: String,
    /// The actor who shared, and signed, this disclosure.
    pub shared_by: ActorId,
    /// When the disclosure was built.
    pub timestamp: Timestamp,
    /// Disclosed fields with their source credentials.
    pub fields: Vec<BundleField>,
}

/// Which of the two disclosure shapes a payload has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisclosureKind {
    /// A single credential.
    Single,
    /// A bundle.
    Bundle,
}

impl DisclosureKind {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Bundle => "bundle",
        }
    }
}

impl std::fmt::Display for DisclosureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed part of an envelope.
///
/// Serializes without a tag: the variant is recognizable on the wire by the
/// presence of `documentType`/`credentialId` or `bundleName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DisclosurePayload {
    /// A single-credential disclosure.
    Single(SingleDisclosure),
    /// A bundle disclosure.
    Bundle(BundleDisclosure),
}

impl DisclosurePayload {
    /// The payload shape.
    pub fn kind(&self) -> DisclosureKind {
        match self {
            Self::Single(_) => DisclosureKind::Single,
            Self::Bundle(_) => DisclosureKind::Bundle,
        }
    }

    /// The claimed signer.
    pub fn shared_by(&self) -> &ActorId {
        match self {
            Self::Single(d) => &d.shared_by,
            Self::Bundle(d) => &d.shared_by,
        }
    }

    /// When the disclosure was built.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Single(d) => d.timestamp,
            Self::Bundle(d) => d.timestamp,
        }
    }

    /// Document type or bundle name, for display.
    pub fn title(&self) -> &str {
        match self {
            Self::Single(d) => &d.document_type,
            Self::Bundle(d) => &d.bundle_name,
        }
    }

    /// Number of disclosed fields.
    pub fn field_count(&self) -> usize {
        match self {
            Self::Single(d) => d.fields.len(),
            Self::Bundle(d) => d.fields.len(),
        }
    }

    /// Every credential whose revocation invalidates this disclosure.
    pub fn credential_ids(&self) -> BTreeSet<CredentialId> {
        match self {
            Self::Single(d) => BTreeSet::from([d.credential_id.clone()]),
            Self::Bundle(d) => d.fields.iter().map(|f| f.credential_id.clone()).collect(),
        }
    }

    /// The bytes the signature covers.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }
}

/// A payload with its signature. The unit that is encoded and transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedEnvelope {
    /// The signed payload.
    #[serde(flatten)]
    pub payload: DisclosurePayload,
    /// `sign(CanonicalBytes(payload), payload.shared_by())`.
    pub signature: Signature,
}

impl SignedEnvelope {
    /// Sign `payload` with its own `sharedBy` identifier.
    pub fn seal(payload: DisclosurePayload) -> Result<Self, DisclosureError> {
        let canonical = payload.signing_input()?;
        let signature = vault_crypto::sign(&canonical, payload.shared_by());
        Ok(Self { payload, signature })
    }

    /// The bytes the signature covers.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        self.payload.signing_input()
    }

    /// Recompute the signature over the payload and compare.
    ///
    /// A payload that cannot be canonicalized has no valid signature.
    pub fn verify_signature(&self) -> bool {
        match self.signing_input() {
            Ok(canonical) => {
                vault_crypto::verify(&canonical, &self.signature, self.payload.shared_by())
            }
            Err(_) => false,
        }
    }
}

/// Disclose the selected fields of one credential, timestamped now.
pub fn build_credential_disclosure(
    credential: &Credential,
    selected_keys: &BTreeSet<String>,
    actor: &ActorId,
) -> Result<SignedEnvelope, DisclosureError> {
    build_credential_disclosure_at(credential, selected_keys, actor, Timestamp::now())
}

/// Disclose the selected fields of one credential at a fixed timestamp.
///
/// Fields keep the credential's order. Keys in the selection that the
/// credential lacks are ignored; if nothing matches the call fails with
/// [`DisclosureError::EmptySelection`].
pub fn build_credential_disclosure_at(
    credential: &Credential,
    selected_keys: &BTreeSet<String>,
    actor: &ActorId,
    timestamp: Timestamp,
) -> Result<SignedEnvelope, DisclosureError> {
    let fields: Vec<Field> = credential
        .fields
        .iter()
        .filter(|f| selected_keys.contains(&f.key))
        .cloned()
        .collect();
    if fields.is_empty() {
        return Err(DisclosureError::EmptySelection);
    }

    let envelope = SignedEnvelope::seal(DisclosurePayload::Single(SingleDisclosure {
        credential_id: credential.id.clone(),
        document_type: credential.document_type.clone(),
        shared_by: actor.clone(),
        timestamp,
        fields,
    }))?;

    tracing::info!(
        credential_id = %credential.id,
        fields = envelope.payload.field_count(),
        "built credential disclosure"
    );
    Ok(envelope)
}

/// Disclose every field of a bundle, timestamped now.
pub fn build_bundle_disclosure(
    bundle: &Bundle,
    actor: &ActorId,
) -> Result<SignedEnvelope, DisclosureError> {
    build_bundle_disclosure_at(bundle, actor, Timestamp::now())
}

/// Disclose every field of a bundle at a fixed timestamp.
///
/// Bundle membership is the selection. A bundle loaded with no fields fails
/// with [`DisclosureError::EmptySelection`].
pub fn build_bundle_disclosure_at(
    bundle: &Bundle,
    actor: &ActorId,
    timestamp: Timestamp,
) -> Result<SignedEnvelope, DisclosureError> {
    if bundle.fields.is_empty() {
        return Err(DisclosureError::EmptySelection);
    }

    let envelope = SignedEnvelope::seal(DisclosurePayload::Bundle(BundleDisclosure {
        bundle_name: bundle.name.clone(),
        shared_by: actor.clone(),
        timestamp,
        fields: bundle.fields.clone(),
    }))?;

    tracing::info!(
        bundle_id = %bundle.id,
        fields = envelope.payload.field_count(),
        "built bundle disclosure"
    );
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::FieldSelection;
    use vault_core::BundleId;

    fn passport() -> Credential {
        Credential {
            id: CredentialId::new("c1").unwrap(),
            document_type: "Passport".to_string(),
            issuer: "Vault Issuer".to_string(),
            issuance_date: Timestamp::from_epoch_secs(0).unwrap(),
            ipfs_hash: String::new(),
            file_data_url: String::new(),
            fields: vec![
                Field::new("Name", "Alice"),
                Field::new("DOB", "2000-01-01"),
                Field::new("Nationality", "Utopia"),
            ],
        }
    }

    fn actor() -> ActorId {
        ActorId::new("did:x:1").unwrap()
    }

    fn at() -> Timestamp {
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
    }

    fn keys(ks: &[&str]) -> BTreeSet<String> {
        ks.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn selection_keeps_credential_order_and_excludes_rest() {
        let env =
            build_credential_disclosure_at(&passport(), &keys(&["Nationality", "Name"]), &actor(), at())
                .unwrap();
        let DisclosurePayload::Single(single) = &env.payload else {
            panic!("expected single disclosure");
        };
        assert_eq!(
            single.fields,
            vec![Field::new("Name", "Alice"), Field::new("Nationality", "Utopia")]
        );
        assert_eq!(single.credential_id.as_str(), "c1");
        assert_eq!(single.document_type, "Passport");
    }

    #[test]
    fn empty_selection_rejected() {
        let err = build_credential_disclosure(&passport(), &BTreeSet::new(), &actor()).unwrap_err();
        assert!(matches!(err, DisclosureError::EmptySelection));
    }

    #[test]
    fn selection_matching_nothing_rejected() {
        let err =
            build_credential_disclosure(&passport(), &keys(&["Height"]), &actor()).unwrap_err();
        assert!(matches!(err, DisclosureError::EmptySelection));
    }

    #[test]
    fn envelope_verifies_and_signature_excludes_itself() {
        let env = build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at())
            .unwrap();
        assert!(env.verify_signature());

        let canonical = env.signing_input().unwrap();
        assert!(!canonical.as_str().contains("signature"));
        assert_eq!(env.signature, vault_crypto::sign(&canonical, &actor()));
    }

    #[test]
    fn envelope_wire_shape_single() {
        let env = build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at())
            .unwrap();
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "credentialId": "c1",
                "documentType": "Passport",
                "sharedBy": "did:x:1",
                "timestamp": "2026-01-15T12:00:00Z",
                "fields": [{"key": "Name", "value": "Alice"}],
                "signature": env.signature.to_hex(),
            })
        );
    }

    #[test]
    fn canonical_signing_input_is_sorted_compact() {
        let env = build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at())
            .unwrap();
        assert_eq!(
            env.signing_input().unwrap().as_str(),
            r#"{"credentialId":"c1","documentType":"Passport","fields":[{"key":"Name","value":"Alice"}],"sharedBy":"did:x:1","timestamp":"2026-01-15T12:00:00Z"}"#
        );
    }

    #[test]
    fn same_inputs_same_signature() {
        let a = build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at()).unwrap();
        let b = build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tampered_value_fails_verification() {
        let mut env =
            build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at()).unwrap();
        if let DisclosurePayload::Single(single) = &mut env.payload {
            single.fields[0].value = "Bob".to_string();
        }
        assert!(!env.verify_signature());
    }

    #[test]
    fn different_signer_fails_verification() {
        let mut env =
            build_credential_disclosure_at(&passport(), &keys(&["Name"]), &actor(), at()).unwrap();
        if let DisclosurePayload::Single(single) = &mut env.payload {
            single.shared_by = ActorId::new("did:x:2").unwrap();
        }
        assert!(!env.verify_signature());
    }

    #[test]
    fn bundle_disclosure_uses_all_members() {
        let degree = Credential {
            id: CredentialId::new("c2").unwrap(),
            document_type: "Degree".to_string(),
            fields: vec![Field::new("University", "Uni")],
            ..passport()
        };
        let bundle = Bundle::assemble(
            "Job application",
            &[
                FieldSelection::new(CredentialId::new("c1").unwrap(), "Name"),
                FieldSelection::new(CredentialId::new("c2").unwrap(), "University"),
            ],
            &[passport(), degree],
        )
        .unwrap();

        let env = build_bundle_disclosure_at(&bundle, &actor(), at()).unwrap();
        assert_eq!(env.payload.kind(), DisclosureKind::Bundle);
        assert_eq!(env.payload.title(), "Job application");
        assert_eq!(env.payload.field_count(), 2);
        let ids: Vec<String> = env.payload.credential_ids().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(env.verify_signature());

        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["bundleName"], "Job application");
        assert!(json.get("documentType").is_none());
        assert_eq!(json["fields"][1]["credentialType"], "Degree");
    }

    #[test]
    fn empty_bundle_rejected() {
        let bundle = Bundle {
            id: BundleId::generate(),
            name: "Empty".to_string(),
            fields: Vec::new(),
        };
        let err = build_bundle_disclosure(&bundle, &actor()).unwrap_err();
        assert!(matches!(err, DisclosureError::EmptySelection));
    }

    #[test]
    fn single_credential_ids_is_its_own_id() {
        let env = build_credential_disclosure(&passport(), &keys(&["DOB"]), &actor()).unwrap();
        assert_eq!(env.payload.credential_ids().len(), 1);
        assert_eq!(env.payload.kind().to_string(), "single");
        assert_eq!(env.payload.shared_by(), &actor());
    }
}
