//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use originmark_core::{Engine, EngineConfig, KeyFile, KeyPair, OriginMarkError, SignatureRecord};
use tracing::debug;

/// Initialize an engine from `ORIGINMARK_*` environment configuration.
pub fn engine() -> Result<Engine> {
    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    Engine::init(config).context("Failed to initialize signing engine")
}

/// Read and decode a sidecar file, importing the unversioned SDK format too.
///
/// The read stops at the configured size limit.
pub fn load_sidecar(engine: &Engine, path: &Path) -> Result<SignatureRecord> {
    let record = engine.read_sidecar_any(path).map_err(|e| {
        let context = if matches!(e, OriginMarkError::Io(_)) {
            format!("Failed to read sidecar file: {}", path.display())
        } else {
            format!("Failed to parse sidecar: {}", path.display())
        };
        anyhow::Error::new(e).context(context)
    })?;
    debug!(path = %path.display(), id = %record.id, "Loaded sidecar");
    Ok(record)
}

/// Resolve the signing key from an inline base64 key or a key file.
///
/// Returns `None` when neither was given.
pub fn load_keypair(private_key: Option<&str>, key_file: Option<&Path>) -> Result<Option<KeyPair>> {
    if let Some(encoded) = private_key {
        let pair = KeyPair::import_private(encoded.trim()).context("Invalid private key")?;
        return Ok(Some(pair));
    }
    if let Some(path) = key_file {
        let pair = KeyFile::load(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        return Ok(Some(pair));
    }
    Ok(None)
}

/// Write a key pair to `path` as a key file.
pub fn save_keypair(pair: &KeyPair, path: &Path) -> Result<()> {
    KeyFile::save(pair, path)
        .with_context(|| format!("Failed to write key file: {}", path.display()))
}

/// Format a timestamp as a human-readable UTC string.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// First `n` characters of a long encoded value, with an ellipsis.
pub fn abbreviate(value: &str, n: usize) -> String {
    match value.char_indices().nth(n) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
