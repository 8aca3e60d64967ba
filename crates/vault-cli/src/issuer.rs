//! # Issuer Subcommand
//!
//! Maintains the revocation registry. Revoking is idempotent; reinstating
//! removes every entry for the credential.

use anyhow::Result;
use clap::{Args, Subcommand};
use vault_core::CredentialId;

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault issuer`.
#[derive(Args, Debug)]
pub struct IssuerArgs {
    #[command(subcommand)]
    pub command: IssuerCommand,
}

/// Issuer subcommands.
#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Revoke a credential.
    Revoke {
        /// Credential id.
        id: CredentialId,
    },

    /// Reinstate a revoked credential.
    Reinstate {
        /// Credential id.
        id: CredentialId,
    },

    /// List revoked credentials.
    Status,
}

/// Execute the issuer subcommand.
pub fn run_issuer(args: &IssuerArgs, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    let registry = vault.revocation_registry()?;
    match &args.command {
        IssuerCommand::Revoke { id } => {
            if registry.revoke(id) {
                vault.save_revocations(&registry)?;
                println!("OK: revoked {id}");
            } else {
                println!("OK: {id} was already revoked");
            }
        }
        IssuerCommand::Reinstate { id } => {
            if registry.reinstate(id) {
                vault.save_revocations(&registry)?;
                println!("OK: reinstated {id}");
            } else {
                println!("OK: {id} was not revoked");
            }
        }
        IssuerCommand::Status => {
            let entries = registry.entries();
            if entries.is_empty() {
                println!("No revoked credentials.");
            }
            for e in &entries {
                println!("{}  revoked {}", e.credential_id, e.revocation_date);
            }
        }
    }
    Ok(0)
}
