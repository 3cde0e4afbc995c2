//! Prove command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use originmark_core::{verify_anchored_inclusion, MerkleHash};
use tracing::{debug, info};

use crate::exit_codes::VerificationFailure;
use crate::manifest::BatchManifest;
use crate::utils;

/// Execute the prove command.
pub fn execute(
    sidecar: PathBuf,
    manifest: PathBuf,
    root: Option<String>,
    quiet: bool,
) -> Result<()> {
    let engine = utils::engine()?;
    let record = utils::load_sidecar(&engine, &sidecar)?;
    let manifest = BatchManifest::load(&manifest)?;

    let expected_root = match root {
        Some(hex) => MerkleHash::from_hex(hex.trim())
            .context("Root must be 64 hex characters")?,
        None => manifest.summary.merkle_root,
    };
    if expected_root != manifest.summary.merkle_root {
        return Err(VerificationFailure(format!(
            "manifest root {} does not match expected root {}",
            manifest.summary.merkle_root, expected_root
        ))
        .into());
    }

    // Prefer the entry carrying this record's id; fall back to any entry
    // with the same fingerprint.
    let record_id = record.id.to_string();
    let entry = manifest
        .entries
        .iter()
        .filter(|e| e.entry.content_hash == record.content_hash)
        .max_by_key(|e| e.entry.metadata.as_deref() == Some(record_id.as_str()))
        .ok_or_else(|| VerificationFailure("sidecar is not part of this batch".into()))?;
    debug!(index = entry.entry.index, "Found batch entry");

    if entry.proof.leaf_index != entry.entry.index {
        return Err(VerificationFailure(format!(
            "inclusion proof is for index {}, manifest entry is {}",
            entry.proof.leaf_index, entry.entry.index
        ))
        .into());
    }
    if !verify_anchored_inclusion(
        &record.content_hash,
        &entry.proof,
        &expected_root,
        manifest.summary.entry_count,
    ) {
        return Err(VerificationFailure(format!(
            "inclusion proof for entry {} does not reach the batch root",
            entry.entry.index
        ))
        .into());
    }
    info!(
        batch_id = %manifest.summary.batch_id,
        index = entry.entry.index,
        "Inclusion verified"
    );

    if !quiet {
        println!();
        println!("{}", "INCLUDED in anchored batch".green().bold());
        println!();
        println!("   {} {}", "Batch ID:".dimmed(), manifest.summary.batch_id);
        println!("   {} {}", "Entry index:".dimmed(), entry.entry.index);
        println!("   {} {}", "Merkle root:".dimmed(), expected_root);
        println!("   {} {}", "Proof depth:".dimmed(), entry.proof.siblings.len());
        println!(
            "   {} {}",
            "Finalized at:".dimmed(),
            utils::format_timestamp(&manifest.summary.finalized_at)
        );
    }

    Ok(())
}
