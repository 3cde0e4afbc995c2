//! Engine configuration.
//!
//! Loaded from environment variables with sensible defaults.

use crate::error::{OriginMarkError, Result, MAX_SIDECAR_SIZE};
use crate::hash::DEFAULT_HASH_CHUNK_SIZE;

/// Tunables for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest sidecar accepted by the decoder, in bytes (default: 1 MiB)
    pub max_sidecar_bytes: usize,
    /// Read buffer size for streaming file hashing (default: 64 KiB)
    pub hash_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_sidecar_bytes: MAX_SIDECAR_SIZE,
            hash_chunk_size: DEFAULT_HASH_CHUNK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `ORIGINMARK_MAX_SIDECAR_BYTES`
    /// - `ORIGINMARK_HASH_CHUNK_SIZE`
    ///
    /// Unset variables fall back to the defaults; set but unparsable ones
    /// are an error rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let parse = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| {
                    OriginMarkError::InvalidConfig(format!("{key} must be a positive integer, got {raw:?}"))
                }),
            }
        };

        let config = Self {
            max_sidecar_bytes: parse("ORIGINMARK_MAX_SIDECAR_BYTES", defaults.max_sidecar_bytes)?,
            hash_chunk_size: parse("ORIGINMARK_HASH_CHUNK_SIZE", defaults.hash_chunk_size)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sidecar_bytes == 0 {
            return Err(OriginMarkError::InvalidConfig(
                "max_sidecar_bytes must be greater than zero".into(),
            ));
        }
        if self.hash_chunk_size == 0 {
            return Err(OriginMarkError::InvalidConfig(
                "hash_chunk_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
