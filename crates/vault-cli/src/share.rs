//! # Share Subcommand
//!
//! Build a signed disclosure and write it as a QR PNG, optionally with the
//! raw transport payload alongside.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use vault_core::{BundleId, CredentialId};
use vault_transfer::{encode, render_png, TransferError};
use vault_vc::{build_bundle_disclosure, build_credential_disclosure, SignedEnvelope};

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault share`.
#[derive(Args, Debug)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Where to write the shared disclosure.
#[derive(Args, Debug, Clone)]
pub struct ShareOutput {
    /// QR code PNG output path.
    #[arg(long, default_value = "share.png")]
    pub out: PathBuf,
    /// Also write the raw transport payload to this path.
    #[arg(long)]
    pub payload: Option<PathBuf>,
}

/// Share subcommands.
#[derive(Subcommand, Debug)]
pub enum ShareCommand {
    /// Disclose selected fields of one credential.
    Credential {
        /// Credential id.
        id: CredentialId,
        /// Field key to disclose. Repeatable.
        #[arg(long = "field", value_name = "KEY")]
        fields: Vec<String>,
        /// Disclose every field.
        #[arg(long, conflicts_with = "fields")]
        all: bool,
        #[command(flatten)]
        output: ShareOutput,
    },

    /// Disclose a whole bundle.
    Bundle {
        /// Bundle id.
        id: BundleId,
        #[command(flatten)]
        output: ShareOutput,
    },
}

/// Execute the share subcommand.
pub fn run_share(args: &ShareArgs, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    let actor = vault.require_actor()?;

    let (envelope, output) = match &args.command {
        ShareCommand::Credential {
            id,
            fields,
            all,
            output,
        } => {
            let Some(credential) = vault.credential(id)? else {
                bail!("credential not found: {id}");
            };
            let selection: BTreeSet<String> = if *all {
                credential.keys().map(str::to_string).collect()
            } else {
                for key in fields {
                    if !credential.has_field(key) {
                        bail!("credential {id} has no field {key:?}");
                    }
                }
                fields.iter().cloned().collect()
            };
            let envelope = build_credential_disclosure(&credential, &selection, &actor)
                .context("failed to build disclosure")?;
            (envelope, output)
        }
        ShareCommand::Bundle { id, output } => {
            let Some(bundle) = vault.bundle(id)? else {
                bail!("bundle not found: {id}");
            };
            let envelope =
                build_bundle_disclosure(&bundle, &actor).context("failed to build disclosure")?;
            (envelope, output)
        }
    };

    write_outputs(&envelope, output, config)?;
    println!(
        "OK: shared {} \"{}\" with {} fields",
        envelope.payload.kind(),
        envelope.payload.title(),
        envelope.payload.field_count()
    );
    println!("  QR code: {}", output.out.display());
    if let Some(path) = &output.payload {
        println!("  Payload: {}", path.display());
    }
    Ok(0)
}

fn write_outputs(envelope: &SignedEnvelope, output: &ShareOutput, config: &VaultConfig) -> Result<()> {
    if let Some(path) = &output.payload {
        write_file(path, encode(envelope)?.as_bytes())?;
    }
    let png = match render_png(envelope, &config.qr) {
        Ok(png) => png,
        Err(e @ TransferError::PayloadTooLarge { .. }) => {
            return Err(e).context("select fewer fields or raise qr.max_version");
        }
        Err(e) => return Err(e).context("failed to render QR code"),
    };
    write_file(&output.out, &png)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
