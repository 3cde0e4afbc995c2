//! Show command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use originmark_core::{verify, PublicKey};

use crate::utils;

/// Execute the show command.
pub fn execute(sidecar: PathBuf, json: bool) -> Result<()> {
    let engine = utils::engine()?;
    let record = utils::load_sidecar(&engine, &sidecar)?;

    if json {
        let bytes = engine.encode_sidecar(&record)?;
        print!("{}", String::from_utf8_lossy(&bytes));
        return Ok(());
    }

    // Signature check without content: tells a corrupt signer field apart
    // from a later content mismatch.
    let verdict = verify(&record.content_hash, &record.signature, &record.public_key);
    let key_id = PublicKey::from_bytes(&record.public_key)
        .map(|pk| pk.key_id())
        .unwrap_or_else(|_| "(malformed public key)".to_string());

    let name = sidecar
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!();
    println!("{} {}", "Signature:".blue().bold(), name);
    println!();
    println!("   {} {}", "ID:".dimmed(), record.id);
    println!("   {} {}", "Content hash:".dimmed(), record.content_hash);
    println!("   {} {}", "Public key:".dimmed(), record.public_key_b64());
    println!("   {} {}", "Key ID:".dimmed(), utils::abbreviate(&key_id, 16));
    println!("   {} {}", "Signature:".dimmed(), utils::abbreviate(&record.signature_b64(), 32));
    println!("   {} {}", "Signed at:".dimmed(), utils::format_timestamp(&record.timestamp));

    let metadata = &record.metadata;
    let fields = [
        ("Author:", metadata.author.clone()),
        ("Model used:", metadata.model_used.clone()),
        ("File name:", metadata.file_name.clone()),
        ("File size:", metadata.file_size.map(|s| format!("{s} bytes"))),
        ("Content type:", metadata.content_type.map(|t| format!("{t:?}").to_lowercase())),
        ("Format:", metadata.format.map(|f| format!("{f:?}").to_lowercase())),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("   {} {}", label.dimmed(), value);
        }
    }

    println!();
    if verdict.is_valid() {
        println!("   {} {}", "Signature check:".dimmed(), verdict.description().green());
    } else {
        println!("   {} {}", "Signature check:".dimmed(), verdict.description().red());
    }

    Ok(())
}
