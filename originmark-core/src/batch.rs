//! Batch anchoring.
//!
//! A [`SignatureBatch`] moves through `Open -> Finalized`. While open it
//! accepts entries, each assigned the next sequential index; duplicates are
//! kept as separate entries. Finalizing builds the Merkle tree (see
//! [`crate::merkle`] for the exact convention) and freezes the entry list.
//!
//! [`BatchAnchor`] owns the current open batch behind a single mutex so
//! concurrent producers get unique, gap-free indices, and hands out
//! finalized batches as shared immutable values.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{OriginMarkError, Result};
use crate::hash::ContentFingerprint;
use crate::keys::key_id_for;
use crate::merkle::{MerkleHash, MerkleProof, MerkleTree};
use crate::seal::random_id;
use crate::sidecar::SignatureRecord;

/// Lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Open,
    Finalized,
}

/// One entry in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: u64,
    pub content_hash: ContentFingerprint,
    /// Signer identity (hex key id, see [`PublicKey::key_id`]) when known.
    ///
    /// [`PublicKey::key_id`]: crate::keys::PublicKey::key_id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    /// Opaque caller-defined string, e.g. the sidecar id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Per-batch values handed to an external anchoring layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSummary {
    pub batch_id: Uuid,
    pub merkle_root: MerkleHash,
    pub entry_count: u64,
    pub finalized_at: DateTime<Utc>,
}

/// Per-entry values handed to an external registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEntry {
    pub batch_id: Uuid,
    pub index: u64,
    pub content_hash: ContentFingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone)]
struct Finalized {
    tree: MerkleTree,
    finalized_at: DateTime<Utc>,
}

/// An ordered collection of fingerprints summarized by one Merkle root.
#[derive(Debug, Clone)]
pub struct SignatureBatch {
    id: Uuid,
    entries: Vec<BatchEntry>,
    finalized: Option<Finalized>,
}

impl SignatureBatch {
    /// Open a new, empty batch with a random identifier.
    pub fn open() -> Result<Self> {
        Ok(Self::with_id(random_id()?))
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            entries: Vec::new(),
            finalized: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BatchState {
        if self.finalized.is_some() {
            BatchState::Finalized
        } else {
            BatchState::Open
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Append a bare fingerprint and return its index.
    pub fn add_entry(&mut self, content_hash: ContentFingerprint) -> Result<u64> {
        self.push(content_hash, None, None)
    }

    /// Append a fingerprint with signer identity and opaque metadata.
    pub fn add_attributed_entry(
        &mut self,
        content_hash: ContentFingerprint,
        signer: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Result<u64> {
        self.push(content_hash, Some(signer.into()), Some(metadata.into()))
    }

    /// Append a sealed record; the signer is its public key's id and the
    /// metadata its record id.
    pub fn add_record(&mut self, record: &SignatureRecord) -> Result<u64> {
        self.add_attributed_entry(
            record.content_hash,
            key_id_for(&record.public_key),
            record.id.to_string(),
        )
    }

    fn push(
        &mut self,
        content_hash: ContentFingerprint,
        signer: Option<String>,
        metadata: Option<String>,
    ) -> Result<u64> {
        if self.finalized.is_some() {
            return Err(OriginMarkError::BatchAlreadyFinalized {
                batch_id: self.id.to_string(),
            });
        }
        let index = self.entries.len() as u64;
        self.entries.push(BatchEntry {
            index,
            content_hash,
            signer,
            metadata,
        });
        Ok(index)
    }

    /// Compute the root and freeze the batch.
    #[instrument(level = "debug", skip_all, fields(batch_id = %self.id, entries = self.entries.len()))]
    pub fn finalize(&mut self) -> Result<AnchorSummary> {
        if self.finalized.is_some() {
            return Err(OriginMarkError::BatchAlreadyFinalized {
                batch_id: self.id.to_string(),
            });
        }
        let leaves: Vec<ContentFingerprint> =
            self.entries.iter().map(|e| e.content_hash).collect();
        let tree = MerkleTree::build(&leaves).ok_or_else(|| OriginMarkError::EmptyBatch {
            batch_id: self.id.to_string(),
        })?;

        self.finalized = Some(Finalized {
            tree,
            finalized_at: Utc::now(),
        });
        let summary = self.summary()?;
        info!(root = %summary.merkle_root, entry_count = summary.entry_count, "Batch finalized");
        Ok(summary)
    }

    fn require_finalized(&self) -> Result<&Finalized> {
        self.finalized
            .as_ref()
            .ok_or_else(|| OriginMarkError::BatchNotYetFinalized {
                batch_id: self.id.to_string(),
            })
    }

    /// Merkle root, available once finalized.
    pub fn root(&self) -> Option<MerkleHash> {
        self.finalized.as_ref().map(|f| f.tree.root())
    }

    pub fn summary(&self) -> Result<AnchorSummary> {
        let finalized = self.require_finalized()?;
        Ok(AnchorSummary {
            batch_id: self.id,
            merkle_root: finalized.tree.root(),
            entry_count: self.entries.len() as u64,
            finalized_at: finalized.finalized_at,
        })
    }

    /// Inclusion proof for the entry at `index`.
    pub fn prove_inclusion(&self, index: u64) -> Result<MerkleProof> {
        let finalized = self.require_finalized()?;
        let proof = usize::try_from(index)
            .ok()
            .and_then(|i| finalized.tree.proof(i))
            .ok_or(OriginMarkError::IndexOutOfRange {
                index,
                len: self.entries.len() as u64,
            })?;
        debug!(batch_id = %self.id, index, depth = proof.siblings.len(), "Built inclusion proof");
        Ok(proof)
    }

    /// Entry records for the external registry.
    pub fn anchor_entries(&self) -> Result<Vec<AnchorEntry>> {
        self.require_finalized()?;
        Ok(self
            .entries
            .iter()
            .map(|e| AnchorEntry {
                batch_id: self.id,
                index: e.index,
                content_hash: e.content_hash,
                signer: e.signer.clone(),
                metadata: e.metadata.clone(),
            })
            .collect())
    }
}

/// Where an appended entry landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTicket {
    pub batch_id: Uuid,
    pub index: u64,
}

/// Thread-safe owner of the current open batch.
#[derive(Debug)]
pub struct BatchAnchor {
    current: Mutex<SignatureBatch>,
}

impl BatchAnchor {
    /// Start with a fresh open batch. Fails only if no batch id can be drawn.
    pub fn new() -> Result<Self> {
        Ok(Self {
            current: Mutex::new(SignatureBatch::open()?),
        })
    }

    fn with_current<T>(&self, f: impl FnOnce(&mut SignatureBatch) -> T) -> T {
        // Batch mutations cannot panic midway, so a poisoned lock still
        // guards a consistent batch.
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn add_entry(&self, content_hash: ContentFingerprint) -> Result<BatchTicket> {
        self.with_current(|batch| -> Result<BatchTicket> {
            let index = batch.add_entry(content_hash)?;
            Ok(BatchTicket {
                batch_id: batch.id(),
                index,
            })
        })
    }

    pub fn add_record(&self, record: &SignatureRecord) -> Result<BatchTicket> {
        self.with_current(|batch| -> Result<BatchTicket> {
            let index = batch.add_record(record)?;
            Ok(BatchTicket {
                batch_id: batch.id(),
                index,
            })
        })
    }

    pub fn current_batch_id(&self) -> Uuid {
        self.with_current(|batch| batch.id())
    }

    pub fn pending(&self) -> usize {
        self.with_current(|batch| batch.len())
    }

    /// Finalize the current batch and open a fresh one in its place.
    ///
    /// On `EmptyBatch` the current batch stays open and unchanged.
    pub fn rotate(&self) -> Result<Arc<SignatureBatch>> {
        self.with_current(|batch| -> Result<Arc<SignatureBatch>> {
            let next = SignatureBatch::open()?;
            batch.finalize()?;
            let finalized = std::mem::replace(batch, next);
            Ok(Arc::new(finalized))
        })
    }
}
