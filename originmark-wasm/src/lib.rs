//! WebAssembly bindings for OriginMark sidecar verification.
//!
//! This module provides client-side verification of OriginMark sidecars
//! directly in the browser without sending files to a server.

use chrono::SecondsFormat;
use originmark_core::{
    fingerprint, sidecar, verify_anchored_inclusion, verify_record, ContentFingerprint, MerkleHash,
    MerkleProof, VerificationOutcome, MAX_SIDECAR_SIZE,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of sidecar verification.
#[derive(Serialize, Deserialize, Default)]
pub struct VerificationResult {
    /// Whether the content is authentic (hash matches and signature valid)
    pub valid: bool,
    /// Whether the content hash matches
    pub content_matches: bool,
    /// Machine-readable outcome: authentic, content_mismatch, signature_rejected
    pub status: String,
    /// Human-readable explanation
    pub message: String,
    /// Sidecar id
    pub id: String,
    /// Signing timestamp (ISO 8601 format)
    pub timestamp: String,
    /// Content hash of the supplied bytes (hex encoded)
    pub content_hash: String,
    /// Expected hash from sidecar (hex encoded)
    pub expected_hash: String,
    /// Signer public key (base64)
    pub public_key: String,
    pub author: Option<String>,
    pub model_used: Option<String>,
    /// Error message if the sidecar could not be read
    pub error: Option<String>,
}

/// Result of a Merkle inclusion check.
#[derive(Serialize, Deserialize)]
pub struct InclusionResult {
    pub included: bool,
    pub error: Option<String>,
}

/// Verify a file against its OriginMark sidecar.
///
/// # Arguments
/// * `file_bytes` - The original file content as bytes
/// * `sidecar_bytes` - The sidecar JSON file content
///
/// # Returns
/// A JSON string containing the verification result
#[wasm_bindgen]
pub fn verify_sidecar_wasm(file_bytes: &[u8], sidecar_bytes: &[u8]) -> String {
    let result = verify_internal(file_bytes, sidecar_bytes).unwrap_or_else(|e| VerificationResult {
        status: "error".to_string(),
        error: Some(e),
        ..VerificationResult::default()
    });
    serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"valid":false,"error":"Unknown error"}"#.to_string())
}

fn verify_internal(file_bytes: &[u8], sidecar_bytes: &[u8]) -> Result<VerificationResult, String> {
    let record = sidecar::decode_any_with_limit(sidecar_bytes, MAX_SIDECAR_SIZE)
        .map_err(|e| format!("Failed to parse sidecar: {}", e))?;

    let outcome = verify_record(&record, file_bytes);
    let status = match &outcome {
        VerificationOutcome::Authentic => "authentic",
        VerificationOutcome::ContentMismatch { .. } => "content_mismatch",
        VerificationOutcome::SignatureRejected { .. } => "signature_rejected",
    };
    let actual = match &outcome {
        VerificationOutcome::ContentMismatch { actual, .. } => *actual,
        _ => record.content_hash,
    };

    Ok(VerificationResult {
        valid: outcome.is_authentic(),
        content_matches: actual == record.content_hash,
        status: status.to_string(),
        message: outcome.description().to_string(),
        id: record.id.to_string(),
        timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        content_hash: actual.to_hex(),
        expected_hash: record.content_hash.to_hex(),
        public_key: record.public_key_b64(),
        author: record.metadata.author.clone(),
        model_used: record.metadata.model_used.clone(),
        error: None,
    })
}

/// Check a Merkle inclusion proof for a content fingerprint.
///
/// # Arguments
/// * `fingerprint_hex` - Content fingerprint (64 hex characters)
/// * `proof_json` - Proof as produced by the batch manifest
/// * `root_hex` - Anchored Merkle root (64 hex characters)
/// * `entry_count` - Entry count anchored together with the root
///
/// # Returns
/// A JSON string `{"included": bool, "error": string | null}`
#[wasm_bindgen]
pub fn verify_inclusion_wasm(
    fingerprint_hex: &str,
    proof_json: &str,
    root_hex: &str,
    entry_count: u64,
) -> String {
    let result = match inclusion_internal(fingerprint_hex, proof_json, root_hex, entry_count) {
        Ok(included) => InclusionResult {
            included,
            error: None,
        },
        Err(e) => InclusionResult {
            included: false,
            error: Some(e),
        },
    };
    serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"included":false,"error":"Unknown error"}"#.to_string())
}

fn inclusion_internal(
    fingerprint_hex: &str,
    proof_json: &str,
    root_hex: &str,
    entry_count: u64,
) -> Result<bool, String> {
    let leaf = ContentFingerprint::from_hex(fingerprint_hex.trim()).map_err(|e| e.to_string())?;
    let proof: MerkleProof =
        serde_json::from_str(proof_json).map_err(|e| format!("Failed to parse proof: {}", e))?;
    let root = MerkleHash::from_hex(root_hex.trim())
        .ok_or_else(|| "Root must be 64 hex characters".to_string())?;
    Ok(verify_anchored_inclusion(&leaf, &proof, &root, entry_count))
}

/// Compute the content fingerprint (lowercase hex SHA-256) of some bytes.
#[wasm_bindgen]
pub fn compute_fingerprint_wasm(bytes: &[u8]) -> String {
    fingerprint(bytes).to_hex()
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
