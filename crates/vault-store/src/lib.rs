//! # vault-store: Credential Store Boundary
//!
//! Persistence is a key-value store of whole collections under fixed
//! logical keys. Every write replaces a collection; there are no partial
//! updates and no transactions.
//!
//! - [`KeyValueStore`]: the storage seam, with [`MemoryStore`] and
//!   [`FileStore`] backends.
//! - [`Vault`]: the holder's operations on top of any store: unlock, add and
//!   delete credentials, assemble bundles, persist the revocation list, lock.

pub mod holder;
pub mod store;

pub use holder::Vault;
pub use store::{CollectionKey, FileStore, KeyValueStore, MemoryStore, StoreError};
