//! Batch command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use originmark_core::{verify, BatchAnchor};
use tracing::{debug, info};

use crate::exit_codes::VerificationFailure;
use crate::manifest::BatchManifest;
use crate::utils;

/// Execute the batch command.
pub fn execute(sidecars: Vec<PathBuf>, output: PathBuf, quiet: bool) -> Result<()> {
    let engine = utils::engine()?;
    let anchor = BatchAnchor::new().context("Failed to open batch")?;

    for path in &sidecars {
        let record = utils::load_sidecar(&engine, path)?;

        // Only records whose own signature holds are worth anchoring.
        let verdict = verify(&record.content_hash, &record.signature, &record.public_key);
        if !verdict.is_valid() {
            return Err(VerificationFailure(format!(
                "{}: {}",
                path.display(),
                verdict.description()
            ))
            .into());
        }

        let ticket = anchor.add_record(&record)?;
        debug!(path = %path.display(), index = ticket.index, "Added to batch");
    }

    let batch = anchor.rotate().context("Failed to finalize batch")?;
    let manifest = BatchManifest::from_batch(&batch)?;
    manifest.save(&output)?;
    info!(
        batch_id = %manifest.summary.batch_id,
        root = %manifest.summary.merkle_root,
        entries = manifest.summary.entry_count,
        "Batch finalized"
    );

    if !quiet {
        println!();
        println!("{}", "Batch finalized!".green().bold());
        println!();
        println!("   {} {}", "Manifest:".dimmed(), output.display());
        println!("   {} {}", "Batch ID:".dimmed(), manifest.summary.batch_id);
        println!("   {} {}", "Entries:".dimmed(), manifest.summary.entry_count);
        println!("   {} {}", "Merkle root:".dimmed(), manifest.summary.merkle_root);
    }

    Ok(())
}
