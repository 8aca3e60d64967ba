//! # vault CLI entry point
//!
//! Parses command-line arguments, resolves configuration, and dispatches
//! to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vault_cli::bundle::{run_bundle, BundleArgs};
use vault_cli::config::VaultConfig;
use vault_cli::credential::{run_credential, CredentialArgs};
use vault_cli::id::{run_id, IdArgs};
use vault_cli::issuer::{run_issuer, IssuerArgs};
use vault_cli::share::{run_share, ShareArgs};
use vault_cli::verify::{run_verify, VerifyArgs};

/// Self-sovereign identity vault.
///
/// Store credentials, share selected fields as signed QR codes, revoke
/// credentials as an issuer, and verify shared codes.
#[derive(Parser, Debug)]
#[command(name = "vault", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the vault's data. Overrides the config file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, unlock, show or lock the holder identity.
    Id(IdArgs),

    /// Ingest and manage credentials.
    Credential(CredentialArgs),

    /// Assemble fields from several credentials into named bundles.
    Bundle(BundleArgs),

    /// Share a credential or bundle as a signed QR code.
    Share(ShareArgs),

    /// Issuer revocation registry.
    Issuer(IssuerArgs),

    /// Verify a shared QR code or payload.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!("vault CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match VaultConfig::load(cli.config.as_deref()) {
        Ok(config) => config.with_data_dir(cli.data_dir),
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match &cli.command {
        Commands::Id(args) => run_id(args, &config),
        Commands::Credential(args) => run_credential(args, &config),
        Commands::Bundle(args) => run_bundle(args, &config),
        Commands::Share(args) => run_share(args, &config),
        Commands::Issuer(args) => run_issuer(args, &config),
        Commands::Verify(args) => run_verify(args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
