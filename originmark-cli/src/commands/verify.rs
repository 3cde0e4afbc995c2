//! Verify command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use originmark_core::{sidecar_path, verify_record_fingerprint, SignatureRecord, VerificationOutcome};
use tracing::{error, info};

use crate::exit_codes::VerificationFailure;
use crate::utils;

/// Execute the verify command.
pub fn execute(file: PathBuf, sidecar: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let engine = utils::engine()?;
    let sidecar = sidecar.unwrap_or_else(|| sidecar_path(&file));

    let actual = engine
        .fingerprint_file(&file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    info!(path = %file.display(), content_hash = %actual, "Hashed file");

    let record = utils::load_sidecar(&engine, &sidecar)?;
    let outcome = verify_record_fingerprint(&record, &actual);

    if json {
        let report = serde_json::json!({
            "valid": outcome.is_authentic(),
            "message": outcome.description(),
            "outcome": outcome,
            "id": record.id,
            "content_hash": actual,
            "metadata": record.metadata,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_outcome(&record, &outcome);
    }

    match outcome {
        VerificationOutcome::Authentic => {
            info!(id = %record.id, "Verification successful");
            Ok(())
        }
        VerificationOutcome::ContentMismatch { expected, actual } => {
            error!(%expected, %actual, "Content has been modified");
            Err(VerificationFailure("content has been modified".into()).into())
        }
        VerificationOutcome::SignatureRejected { verdict } => {
            error!(reason = %verdict.description(), "Signature verification failed");
            Err(VerificationFailure(verdict.description().to_string()).into())
        }
    }
}

fn print_outcome(record: &SignatureRecord, outcome: &VerificationOutcome) {
    println!();
    match outcome {
        VerificationOutcome::Authentic => {
            println!("{}", "╔════════════════════════════════════════╗".green());
            println!("{}", "║              AUTHENTIC                 ║".green().bold());
            println!("{}", "╚════════════════════════════════════════╝".green());
            println!();
            println!("   {} {}", "Signature:".dimmed(), "Valid (Ed25519)".green());
            println!("   {} {}", "Content:".dimmed(), "Matches original".green());
            println!("   {} {}", "Signed at:".dimmed(), utils::format_timestamp(&record.timestamp));
            let metadata = &record.metadata;
            if let Some(author) = &metadata.author {
                println!("   {} {}", "Author:".dimmed(), author);
            }
            if let Some(model) = &metadata.model_used {
                println!("   {} {}", "Model used:".dimmed(), model);
            }
            if let Some(name) = &metadata.file_name {
                println!("   {} {}", "File name:".dimmed(), name);
            }
        }
        VerificationOutcome::ContentMismatch { expected, actual } => {
            print_tampered_banner();
            println!("   {} {}", "Content:".dimmed(), "MODIFIED since signing".red());
            println!("   {} {}", "Expected:".dimmed(), utils::abbreviate(&expected.to_hex(), 16));
            println!("   {} {}", "Got:".dimmed(), utils::abbreviate(&actual.to_hex(), 16));
        }
        VerificationOutcome::SignatureRejected { verdict } => {
            print_tampered_banner();
            println!("   {} {}", "Signature:".dimmed(), verdict.description().red());
        }
    }
}

fn print_tampered_banner() {
    println!("{}", "╔════════════════════════════════════════╗".red());
    println!("{}", "║              TAMPERED                  ║".red().bold());
    println!("{}", "╚════════════════════════════════════════╝".red());
    println!();
}
