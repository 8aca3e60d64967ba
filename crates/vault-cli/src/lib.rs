//! # vault-cli: Identity Vault on the Command Line
//!
//! One binary, three roles:
//!
//! - Holder: `vault id`, `vault credential`, `vault bundle`, `vault share`.
//! - Issuer: `vault issuer` (revocation registry).
//! - Verifier: `vault verify`.
//!
//! ```bash
//! vault id new
//! vault credential add passport.jpg
//! vault share credential <id> --field "Full Name" --out share.png
//! vault verify --image share.png
//! ```
//!
//! All state lives in JSON files under the data directory (`--data-dir`,
//! default `.vault`). Holder and issuer share that directory here; the
//! revocation list would live with the issuer in a deployed system.

pub mod bundle;
pub mod config;
pub mod credential;
pub mod id;
pub mod issuer;
pub mod share;
pub mod verify;

use vault_store::{FileStore, Vault};

use crate::config::VaultConfig;

/// Open the file-backed vault under the configured data directory.
pub fn open_vault(config: &VaultConfig) -> Vault<FileStore> {
    tracing::debug!(data_dir = %config.data_dir.display(), "opening vault");
    Vault::new(FileStore::new(config.data_dir.clone()))
}
