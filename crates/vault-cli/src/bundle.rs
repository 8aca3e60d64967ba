//! # Bundle Subcommand
//!
//! Assemble named bundles from fields across stored credentials.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use vault_core::BundleId;
use vault_vc::FieldSelection;

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault bundle`.
#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

/// Bundle subcommands.
#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Create a bundle. Field values are copied from the credentials now.
    Create {
        /// Bundle display name.
        #[arg(long)]
        name: String,
        /// A field to include, as `<credential-id>:<key>`. Repeatable.
        #[arg(long = "field", value_name = "CREDENTIAL:KEY")]
        fields: Vec<FieldSelection>,
    },

    /// List bundles, newest first.
    List,

    /// Delete a bundle.
    Delete {
        /// Bundle id.
        id: BundleId,
    },
}

/// Execute the bundle subcommand.
pub fn run_bundle(args: &BundleArgs, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    match &args.command {
        BundleCommand::Create { name, fields } => {
            vault.require_actor()?;
            let bundle = vault
                .create_bundle(name, fields)
                .context("failed to create bundle")?;
            println!("OK: created bundle {} ({})", bundle.name, bundle.id);
            for f in &bundle.fields {
                println!("  [{}] {}: {}", f.credential_type, f.key, f.value);
            }
            Ok(0)
        }
        BundleCommand::List => {
            let bundles = vault.bundles()?;
            if bundles.is_empty() {
                println!("No bundles.");
            }
            for b in &bundles {
                println!(
                    "{}  {}  {} fields from {} credentials",
                    b.id,
                    b.name,
                    b.fields.len(),
                    b.credential_ids().len()
                );
            }
            Ok(0)
        }
        BundleCommand::Delete { id } => {
            if !vault.delete_bundle(id)? {
                bail!("bundle not found: {id}");
            }
            println!("OK: deleted bundle {id}");
            Ok(0)
        }
    }
}
