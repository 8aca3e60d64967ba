//! # Identity Subcommand
//!
//! Creates, unlocks, shows and locks the holder identity. The actor id is
//! the signing secret for every disclosure the holder makes.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use vault_core::ActorId;

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault id`.
#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(subcommand)]
    pub command: IdCommand,
}

/// Identity subcommands.
#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Mint a fresh identity and unlock the vault with it.
    New,

    /// Unlock the vault with an existing identity.
    Unlock {
        /// The actor identifier, e.g. `did:vault:...`.
        #[arg(value_name = "DID")]
        did: String,
    },

    /// Show the unlocked identity.
    Show {
        /// Print the full identifier instead of a redacted form.
        #[arg(long)]
        reveal: bool,
    },

    /// Forget the identity, credentials and bundles.
    Lock,
}

/// Execute the identity subcommand.
pub fn run_id(args: &IdArgs, config: &VaultConfig) -> Result<u8> {
    let vault = open_vault(config);
    match &args.command {
        IdCommand::New => {
            let actor = ActorId::generate();
            vault.unlock(&actor).context("failed to store identity")?;
            println!("OK: created identity");
            println!("  {}", actor.expose());
            println!("  Keep this identifier private: anyone holding it can sign as you.");
            Ok(0)
        }
        IdCommand::Unlock { did } => {
            let actor = ActorId::new(did.as_str()).context("invalid actor identifier")?;
            vault.unlock(&actor).context("failed to store identity")?;
            println!("OK: vault unlocked as {}", actor.redacted());
            Ok(0)
        }
        IdCommand::Show { reveal } => match vault.actor()? {
            Some(actor) if *reveal => {
                println!("{}", actor.expose());
                Ok(0)
            }
            Some(actor) => {
                println!("{}", actor.redacted());
                Ok(0)
            }
            None => {
                println!("LOCKED: no identity; run `vault id new` or `vault id unlock <did>`");
                Ok(1)
            }
        },
        IdCommand::Lock => {
            vault.lock().context("failed to lock vault")?;
            println!("OK: vault locked");
            Ok(0)
        }
    }
}
