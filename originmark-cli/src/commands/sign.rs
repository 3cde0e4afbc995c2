//! Sign command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use originmark_core::{sidecar_path, ContentType, SidecarFormat, SidecarMetadata};
use tracing::{debug, info, warn};

use crate::utils;
use crate::OutputFormat;

pub struct SignArgs {
    pub file: PathBuf,
    pub author: Option<String>,
    pub model: Option<String>,
    pub private_key: Option<String>,
    pub key_file: Option<PathBuf>,
    pub save_key: Option<PathBuf>,
    pub format: OutputFormat,
    pub dry_run: bool,
}

/// Execute the sign command.
pub fn execute(args: SignArgs, quiet: bool) -> Result<()> {
    let engine = utils::engine()?;

    let file_size = std::fs::metadata(&args.file)
        .with_context(|| format!("Failed to read file: {}", args.file.display()))?
        .len();

    let metadata = SidecarMetadata {
        author: args.author,
        model_used: args.model,
        format: match args.format {
            OutputFormat::Json => None,
            OutputFormat::C2pa => Some(SidecarFormat::C2pa),
        },
        ..SidecarMetadata::default()
    };

    let supplied = utils::load_keypair(args.private_key.as_deref(), args.key_file.as_deref())?;
    let generated = supplied.is_none();
    let keypair = match supplied {
        Some(pair) => pair,
        None => {
            warn!("No signing key supplied, generating an ephemeral key pair");
            engine.generate_keypair().context("Failed to generate key pair")?
        }
    };
    debug!(key_id = %keypair.public_key().key_id(), generated, "Signing key ready");

    if args.dry_run {
        let content_hash = engine
            .fingerprint_file(&args.file)
            .with_context(|| format!("Failed to read file: {}", args.file.display()))?;
        if !quiet {
            println!("{}", "[DRY RUN] No files were written".yellow().bold());
            println!();
            println!("   {} {}", "File:".dimmed(), args.file.display());
            println!("   {} {} bytes", "Size:".dimmed(), file_size);
            println!(
                "   {} {}",
                "Content type:".dimmed(),
                format!("{:?}", ContentType::from_path(&args.file)).to_lowercase()
            );
            println!("   {} {}", "Content hash:".dimmed(), content_hash);
            println!("   {} {}", "Sidecar:".dimmed(), sidecar_path(&args.file).display());
            println!("   {} {}", "Public key:".dimmed(), keypair.public_key().export());
        }
        return Ok(());
    }

    let (record, written) = engine
        .seal_file(&args.file, metadata, &keypair)
        .with_context(|| format!("Failed to write sidecar for {}", args.file.display()))?;
    info!(path = %written.display(), id = %record.id, "Sidecar saved");

    if let Some(path) = &args.save_key {
        utils::save_keypair(&keypair, path)?;
    }

    if !quiet {
        println!();
        println!("{}", "File signed!".green().bold());
        println!();
        println!("   {} {}", "Signature saved:".dimmed(), written.display());
        println!("   {} {}", "ID:".dimmed(), record.id);
        println!("   {} {}", "Content hash:".dimmed(), utils::abbreviate(&record.content_hash.to_hex(), 32));
        println!("   {} {}", "Public key:".dimmed(), record.public_key_b64());
        println!("   {} {}", "Timestamp:".dimmed(), utils::format_timestamp(&record.timestamp));
        if matches!(record.metadata.format, Some(SidecarFormat::C2pa)) {
            println!("   {} {}", "Format:".dimmed(), "C2PA (Content Authenticity Initiative)");
        }
        if let Some(path) = &args.save_key {
            println!("   {} {}", "Key pair saved to:".dimmed(), path.display());
        } else if generated {
            println!();
            println!(
                "{}",
                "Signed with an ephemeral key that was not saved. Use --save-key to keep it."
                    .yellow()
            );
        }
    }

    Ok(())
}
