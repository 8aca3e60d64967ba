//! # Holder Vault
//!
//! The holder's view of the store: typed collections and the operations the
//! holder performs on them. Each operation is a read-modify-write of a whole
//! collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use vault_core::{ActorId, BundleId, CredentialId};
use vault_vc::{Bundle, Credential, FieldSelection, RevocationEntry, RevocationRegistry};

use crate::store::{CollectionKey, KeyValueStore, StoreError};

/// Holder operations over a [`KeyValueStore`].
#[derive(Debug)]
pub struct Vault<S> {
    store: S,
}

impl<S: KeyValueStore> Vault<S> {
    /// Open a vault over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load<T: DeserializeOwned>(&self, key: CollectionKey) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Corrupt { key, source }),
        }
    }

    fn save<T: Serialize>(&self, key: CollectionKey, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.store.set(key, &value)
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Record `actor` as the unlocked identity.
    pub fn unlock(&self, actor: &ActorId) -> Result<(), StoreError> {
        self.save(CollectionKey::DigitalId, actor)?;
        tracing::info!(actor = %actor.redacted(), "vault unlocked");
        Ok(())
    }

    /// The unlocked identity, if any.
    pub fn actor(&self) -> Result<Option<ActorId>, StoreError> {
        self.load(CollectionKey::DigitalId)
    }

    /// The unlocked identity, or [`StoreError::Locked`].
    pub fn require_actor(&self) -> Result<ActorId, StoreError> {
        self.actor()?.ok_or(StoreError::Locked)
    }

    /// Forget the identity, credentials and bundles. The revocation list is
    /// issuer-side state and survives.
    pub fn lock(&self) -> Result<(), StoreError> {
        self.store.remove(CollectionKey::Credentials)?;
        self.store.remove(CollectionKey::Bundles)?;
        self.store.remove(CollectionKey::DigitalId)?;
        tracing::info!("vault locked");
        Ok(())
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// All credentials, newest first.
    pub fn credentials(&self) -> Result<Vec<Credential>, StoreError> {
        Ok(self.load(CollectionKey::Credentials)?.unwrap_or_default())
    }

    /// One credential by id.
    pub fn credential(&self, id: &CredentialId) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials()?.into_iter().find(|c| &c.id == id))
    }

    /// Add a credential at the front of the collection.
    pub fn add_credential(&self, credential: Credential) -> Result<(), StoreError> {
        let mut all = self.credentials()?;
        all.insert(0, credential);
        self.save(CollectionKey::Credentials, &all)
    }

    /// Delete a credential. Bundles that copied its fields are unaffected.
    /// Returns `false` if no such credential existed.
    pub fn delete_credential(&self, id: &CredentialId) -> Result<bool, StoreError> {
        let mut all = self.credentials()?;
        let before = all.len();
        all.retain(|c| &c.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.save(CollectionKey::Credentials, &all)?;
        tracing::info!(credential_id = %id, "credential deleted");
        Ok(true)
    }

    // ── Bundles ──────────────────────────────────────────────────────

    /// All bundles, newest first.
    pub fn bundles(&self) -> Result<Vec<Bundle>, StoreError> {
        Ok(self.load(CollectionKey::Bundles)?.unwrap_or_default())
    }

    /// One bundle by id.
    pub fn bundle(&self, id: &BundleId) -> Result<Option<Bundle>, StoreError> {
        Ok(self.bundles()?.into_iter().find(|b| &b.id == id))
    }

    /// Assemble a bundle from the current credentials and store it.
    pub fn create_bundle(
        &self,
        name: &str,
        selections: &[FieldSelection],
    ) -> Result<Bundle, StoreError> {
        let bundle = Bundle::assemble(name, selections, &self.credentials()?)?;
        let mut all = self.bundles()?;
        all.insert(0, bundle.clone());
        self.save(CollectionKey::Bundles, &all)?;
        tracing::info!(bundle_id = %bundle.id, fields = bundle.fields.len(), "bundle created");
        Ok(bundle)
    }

    /// Delete a bundle. Returns `false` if no such bundle existed.
    pub fn delete_bundle(&self, id: &BundleId) -> Result<bool, StoreError> {
        let mut all = self.bundles()?;
        let before = all.len();
        all.retain(|b| &b.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.save(CollectionKey::Bundles, &all)?;
        Ok(true)
    }

    // ── Revocation list ──────────────────────────────────────────────

    /// Restore the revocation registry from storage.
    pub fn revocation_registry(&self) -> Result<RevocationRegistry, StoreError> {
        let entries: Vec<RevocationEntry> =
            self.load(CollectionKey::RevocationList)?.unwrap_or_default();
        Ok(RevocationRegistry::from_entries(entries))
    }

    /// Persist the registry's current entries.
    pub fn save_revocations(&self, registry: &RevocationRegistry) -> Result<(), StoreError> {
        self.save(CollectionKey::RevocationList, &registry.entries())
    }
}
