//! OriginMark Core - content attestation engine
//!
//! This crate binds a content fingerprint to an Ed25519 signature and a
//! portable JSON sidecar, and verifies that binding later, offline, against
//! possibly-modified content.
//!
//! # Features
//!
//! - Canonical SHA-256 content fingerprints, streamed for large files
//! - Ed25519 key pairs with seeded determinism and zeroized secrets
//! - Fine-grained verification verdicts that separate content edits from bad signatures
//! - Versioned, strictly validated sidecar codec
//! - Merkle batch anchoring with compact inclusion proofs
//!
//! # Example
//!
//! ```no_run
//! use originmark_core::{Engine, EngineConfig, SidecarMetadata, VerificationOutcome};
//!
//! # fn example() -> originmark_core::Result<()> {
//! let engine = Engine::init(EngineConfig::default())?;
//! let keypair = engine.generate_keypair()?;
//!
//! let metadata = SidecarMetadata {
//!     author: Some("Alice".into()),
//!     model_used: Some("GPT-4".into()),
//!     ..SidecarMetadata::default()
//! };
//! let record = engine.seal(b"Hello from OriginMark", metadata, &keypair)?;
//! let sidecar = engine.encode_sidecar(&record)?;
//!
//! // Later, anywhere, with no network access:
//! let record = engine.decode_sidecar(&sidecar)?;
//! assert_eq!(
//!     engine.verify_record(&record, b"Hello from OriginMark"),
//!     VerificationOutcome::Authentic
//! );
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod seal;
pub mod sidecar;
pub mod signer;
pub mod verifier;

// Re-export main types for convenience
pub use batch::{
    AnchorEntry, AnchorSummary, BatchAnchor, BatchEntry, BatchState, BatchTicket, SignatureBatch,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{OriginMarkError, Result, CURRENT_SIDECAR_VERSION, MAX_SIDECAR_SIZE};
pub use hash::{
    fingerprint, fingerprint_file, fingerprint_reader, ContentFingerprint, FingerprintHasher,
    DEFAULT_HASH_CHUNK_SIZE, FINGERPRINT_BYTES,
};
pub use keys::{KeyFile, KeyPair, PublicKey, KEYPAIR_BYTES, PUBLIC_KEY_BYTES, SECRET_KEY_BYTES};
pub use merkle::{verify_anchored_inclusion, verify_inclusion, MerkleHash, MerkleProof, MerkleTree, MAX_PROOF_DEPTH};
pub use seal::SealBuilder;
pub use sidecar::{
    sidecar_path, ContentType, SidecarFormat, SidecarMetadata, SignatureRecord, SIDECAR_SUFFIX,
};
pub use signer::{sign, SIGNATURE_BYTES};
pub use verifier::{verify, verify_record, verify_record_fingerprint, Verdict, VerificationOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    /// Integration test: generate keys, seal, encode, decode and verify.
    #[test]
    fn test_full_seal_workflow() {
        let engine = Engine::init(EngineConfig::default()).expect("engine init");
        let keypair = engine.generate_keypair().expect("keygen");

        let content = b"Hello from OriginMark";
        let record = SealBuilder::new(content)
            .with_author("Alice")
            .with_model("GPT-4")
            .build(&keypair)
            .expect("seal");

        let bytes = engine.encode_sidecar(&record).expect("encode");
        let decoded = engine.decode_sidecar(&bytes).expect("decode");
        assert_eq!(decoded, record);
        assert!(engine.verify_record(&decoded, content).is_authentic());
        assert!(!engine
            .verify_record(&decoded, b"Hello from OriginMark!")
            .is_authentic());
    }
}
