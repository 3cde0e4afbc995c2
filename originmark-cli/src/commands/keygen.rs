//! Keygen command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use originmark_core::SECRET_KEY_BYTES;
use tracing::info;

use crate::utils;

/// Execute the keygen command.
pub fn execute(output: Option<PathBuf>, seed: Option<String>, quiet: bool) -> Result<()> {
    let engine = utils::engine()?;

    let pair = match seed {
        Some(seed_hex) => {
            let seed = hex::decode(seed_hex.trim()).context("Seed must be hex-encoded")?;
            if seed.len() != SECRET_KEY_BYTES {
                bail!(
                    "Seed must be {} bytes ({} hex characters), got {} bytes",
                    SECRET_KEY_BYTES,
                    SECRET_KEY_BYTES * 2,
                    seed.len()
                );
            }
            engine.keypair_from_seed(&seed)?
        }
        None => engine.generate_keypair().context("Failed to generate key pair")?,
    };
    let public_key = pair.public_key();
    info!(key_id = %public_key.key_id(), "Generated key pair");

    match &output {
        Some(path) => {
            utils::save_keypair(&pair, path)?;
            if !quiet {
                println!();
                println!("{}", "Key pair generated!".green().bold());
                println!();
                println!("   {} {}", "Key file:".dimmed(), path.display());
                println!("   {} {}", "Public key:".dimmed(), public_key.export());
                println!("   {} {}", "Key ID:".dimmed(), utils::abbreviate(&public_key.key_id(), 16));
            }
        }
        None => {
            // Without an output file the keys are the command's only product,
            // so they are printed even in quiet mode.
            println!("private_key: {}", pair.export_private().as_str());
            println!("public_key:  {}", public_key.export());
            if !quiet {
                println!();
                println!(
                    "{}",
                    "Keep your private key secure and never share it!".yellow().bold()
                );
            }
        }
    }

    Ok(())
}
