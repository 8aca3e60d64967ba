//! # Revocation Registry
//!
//! Issuer-side set of revoked credential ids, standing in for a public
//! revocation ledger. A credential is revoked iff at least one entry names
//! it.
//!
//! The registry is an ordinary value with its own lifecycle. Issuer tooling
//! and the verifier each receive it explicitly, typically as
//! `Arc<RevocationRegistry>`; there is no process-wide instance.
//!
//! ## Concurrency
//!
//! Every operation holds the lock for its whole read-modify-write, so
//! `revoke` cannot insert a duplicate entry under concurrent callers. No
//! ordering beyond last-writer-wins is promised between operations.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use vault_core::{CredentialId, Timestamp};

/// One revocation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationEntry {
    /// The revoked credential.
    pub credential_id: CredentialId,
    /// When it was revoked.
    pub revocation_date: Timestamp,
}

/// Read-only revocation queries, as used by the verifier.
pub trait RevocationLookup: Send + Sync {
    /// Whether the credential is revoked.
    fn is_revoked(&self, credential_id: &CredentialId) -> bool;

    /// Whether any of the credentials is revoked. A bundle disclosure is
    /// invalid as a whole if any constituent credential is revoked.
    fn is_any_revoked(&self, credential_ids: &BTreeSet<CredentialId>) -> bool {
        credential_ids.iter().any(|id| self.is_revoked(id))
    }
}

/// In-memory revocation set.
#[derive(Debug, Default)]
pub struct RevocationRegistry {
    entries: RwLock<Vec<RevocationEntry>>,
}

impl RevocationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry restored from persisted entries.
    pub fn from_entries(entries: Vec<RevocationEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Revoke a credential now. Returns `false` if it was already revoked,
    /// in which case nothing changes.
    pub fn revoke(&self, credential_id: &CredentialId) -> bool {
        self.revoke_at(credential_id, Timestamp::now())
    }

    /// Revoke a credential with an explicit revocation date.
    pub fn revoke_at(&self, credential_id: &CredentialId, revocation_date: Timestamp) -> bool {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| &e.credential_id == credential_id) {
            tracing::debug!(%credential_id, "already revoked");
            return false;
        }
        entries.push(RevocationEntry {
            credential_id: credential_id.clone(),
            revocation_date,
        });
        tracing::info!(%credential_id, "credential revoked");
        true
    }

    /// Remove every entry for a credential. Returns `false` if it was not
    /// revoked.
    pub fn reinstate(&self, credential_id: &CredentialId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| &e.credential_id != credential_id);
        let removed = entries.len() != before;
        if removed {
            tracing::info!(%credential_id, "credential reinstated");
        }
        removed
    }

    /// Earliest revocation date recorded for a credential.
    pub fn revoked_at(&self, credential_id: &CredentialId) -> Option<Timestamp> {
        self.entries
            .read()
            .iter()
            .filter(|e| &e.credential_id == credential_id)
            .map(|e| e.revocation_date)
            .min()
    }

    /// Snapshot of all entries, for persistence.
    pub fn entries(&self) -> Vec<RevocationEntry> {
        self.entries.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl RevocationLookup for RevocationRegistry {
    fn is_revoked(&self, credential_id: &CredentialId) -> bool {
        self.entries
            .read()
            .iter()
            .any(|e| &e.credential_id == credential_id)
    }

    fn is_any_revoked(&self, credential_ids: &BTreeSet<CredentialId>) -> bool {
        let entries = self.entries.read();
        entries.iter().any(|e| credential_ids.contains(&e.credential_id))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Revoke(u8),
        Reinstate(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..5).prop_map(Op::Revoke),
            (0u8..5).prop_map(Op::Reinstate),
        ]
    }

    proptest! {
        /// After any sequence of operations, an id is revoked iff its last
        /// operation was a revoke.
        #[test]
        fn status_follows_last_operation(ops in prop::collection::vec(op(), 0..40)) {
            let reg = RevocationRegistry::new();
            let mut model = BTreeSet::new();
            for op in &ops {
                match op {
                    Op::Revoke(n) => {
                        reg.revoke(&CredentialId::new(format!("c{n}")).unwrap());
                        model.insert(*n);
                    }
                    Op::Reinstate(n) => {
                        reg.reinstate(&CredentialId::new(format!("c{n}")).unwrap());
                        model.remove(n);
                    }
                }
            }
            for n in 0u8..5 {
                let id = CredentialId::new(format!("c{n}")).unwrap();
                prop_assert_eq!(reg.is_revoked(&id), model.contains(&n));
            }
            prop_assert_eq!(reg.len(), model.len());
        }
    }
}
