//! Batch manifest written by `batch` and read by `prove`.

use std::path::Path;

use anyhow::{Context, Result};
use originmark_core::{AnchorEntry, AnchorSummary, MerkleProof, SignatureBatch};
use serde::{Deserialize, Serialize};

/// A finalized batch summary plus every entry's inclusion proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub summary: AnchorSummary,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub entry: AnchorEntry,
    pub proof: MerkleProof,
}

impl BatchManifest {
    /// Build from a finalized batch.
    pub fn from_batch(batch: &SignatureBatch) -> Result<Self> {
        let summary = batch.summary()?;
        let entries = batch
            .anchor_entries()?
            .into_iter()
            .map(|entry| -> Result<ManifestEntry> {
                let proof = batch.prove_inclusion(entry.index)?;
                Ok(ManifestEntry { entry, proof })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { summary, entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(self).context("Failed to serialize manifest")?;
        json.push(b'\n');
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))
    }
}
