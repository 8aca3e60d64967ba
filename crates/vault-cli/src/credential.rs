//! # Credential Subcommand
//!
//! Ingest document images into credentials and manage the holder's list.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use vault_core::CredentialId;
use vault_vc::{issue_credential, DocumentAnalyzer, FallbackAnalyzer, MockAnalyzer, RevocationLookup};

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault credential`.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[command(subcommand)]
    pub command: CredentialCommand,
}

/// Credential subcommands.
#[derive(Subcommand, Debug)]
pub enum CredentialCommand {
    /// Analyze a document image and store the resulting credential.
    Add {
        /// Path to the document image.
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        /// MIME type; inferred from the file extension if omitted.
        #[arg(long)]
        mime: Option<String>,
    },

    /// List stored credentials, newest first.
    List,

    /// Show one credential's fields.
    Show {
        /// Credential id.
        id: CredentialId,
    },

    /// Delete a credential. Bundles keep their copied fields.
    Delete {
        /// Credential id.
        id: CredentialId,
    },
}

/// Execute the credential subcommand.
pub fn run_credential(args: &CredentialArgs, config: &VaultConfig) -> Result<u8> {
    match &args.command {
        CredentialCommand::Add { image, mime } => cmd_add(image, mime.as_deref(), config),
        CredentialCommand::List => cmd_list(config),
        CredentialCommand::Show { id } => cmd_show(id, config),
        CredentialCommand::Delete { id } => {
            if open_vault(config).delete_credential(id)? {
                println!("OK: deleted credential {id}");
                Ok(0)
            } else {
                bail!("credential not found: {id}");
            }
        }
    }
}

/// MIME type for a document image path.
pub fn infer_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

fn cmd_add(image: &Path, mime: Option<&str>, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    vault.require_actor()?;

    let mime = match mime.or_else(|| infer_mime(image)) {
        Some(mime) => mime,
        None => bail!(
            "cannot infer MIME type of {}; pass --mime",
            image.display()
        ),
    };
    let bytes = std::fs::read(image)
        .with_context(|| format!("failed to read document image: {}", image.display()))?;

    let analyzer = FallbackAnalyzer::new(MockAnalyzer);
    let analyzed = analyzer
        .analyze(&bytes, mime)
        .with_context(|| format!("failed to analyze {}", image.display()))?;
    let credential = issue_credential(analyzed, &bytes, mime, &config.issuer);
    vault.add_credential(credential.clone())?;

    println!("OK: added {} ({})", credential.document_type, credential.id);
    for field in &credential.fields {
        println!("  {}: {}", field.key, field.value);
    }
    Ok(0)
}

fn cmd_list(config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    let credentials = vault.credentials()?;
    if credentials.is_empty() {
        println!("No credentials.");
        return Ok(0);
    }
    let registry = vault.revocation_registry()?;
    for c in &credentials {
        let status = if registry.is_revoked(&c.id) { "  [REVOKED]" } else { "" };
        println!(
            "{}  {}  issued {}  {} fields{}",
            c.id,
            c.document_type,
            c.issuance_date,
            c.fields.len(),
            status
        );
    }
    Ok(0)
}

fn cmd_show(id: &CredentialId, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    let Some(c) = vault.credential(id)? else {
        bail!("credential not found: {id}");
    };
    println!("{} ({})", c.document_type, c.id);
    println!("  Issuer: {}", c.issuer);
    println!("  Issued: {}", c.issuance_date);
    println!("  Content: {}", c.ipfs_hash);
    if let Some(at) = vault.revocation_registry()?.revoked_at(id) {
        println!("  Revoked: {at}");
    }
    for field in &c.fields {
        println!("  {}: {}", field.key, field.value);
    }
    Ok(0)
}
