//! Explicitly initialized engine handle.
//!
//! All engine operations hang off an [`Engine`] obtained from
//! [`Engine::init`]. Initialization probes the OS random source once so that
//! an unusable CSPRNG surfaces as a catchable error instead of a failure
//! deep inside key generation. There is no process-wide state; any number of
//! engines with different configurations may coexist.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::batch::SignatureBatch;
use crate::config::EngineConfig;
use crate::error::{OriginMarkError, Result};
use crate::hash::{self, ContentFingerprint};
use crate::keys::KeyPair;
use crate::merkle::{self, MerkleHash, MerkleProof};
use crate::seal::SealBuilder;
use crate::sidecar::{self, ContentType, SidecarMetadata, SignatureRecord};
use crate::signer::{self, SIGNATURE_BYTES};
use crate::verifier::{self, Verdict, VerificationOutcome};

/// Ready handle for signing, verification and batching.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Validate `config` and confirm the OS CSPRNG is usable.
    #[instrument(level = "debug", skip_all)]
    pub fn init(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut probe = [0u8; 16];
        getrandom::fill(&mut probe)
            .map_err(|e| OriginMarkError::EntropyUnavailable(e.to_string()))?;

        debug!(
            max_sidecar_bytes = config.max_sidecar_bytes,
            hash_chunk_size = config.hash_chunk_size,
            "Engine initialized"
        );
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Keys
    // ---------------------------------------------------------------------

    pub fn generate_keypair(&self) -> Result<KeyPair> {
        KeyPair::generate()
    }

    pub fn keypair_from_seed(&self, seed: &[u8]) -> Result<KeyPair> {
        KeyPair::from_seed(seed)
    }

    // ---------------------------------------------------------------------
    // Hashing, signing, verification
    // ---------------------------------------------------------------------

    pub fn compute_fingerprint(&self, content: &[u8]) -> ContentFingerprint {
        hash::fingerprint(content)
    }

    /// Stream a file through the hasher using the configured chunk size.
    pub fn fingerprint_file(&self, path: &Path) -> Result<ContentFingerprint> {
        hash::fingerprint_file(path, self.config.hash_chunk_size)
    }

    pub fn sign(&self, fingerprint: &ContentFingerprint, keypair: &KeyPair) -> [u8; SIGNATURE_BYTES] {
        signer::sign(fingerprint, keypair)
    }

    pub fn verify(
        &self,
        fingerprint: &ContentFingerprint,
        signature: &[u8],
        public_key: &[u8],
    ) -> Verdict {
        verifier::verify(fingerprint, signature, public_key)
    }

    pub fn verify_record(&self, record: &SignatureRecord, content: &[u8]) -> VerificationOutcome {
        verifier::verify_record(record, content)
    }

    // ---------------------------------------------------------------------
    // Sidecar codec
    // ---------------------------------------------------------------------

    pub fn encode_sidecar(&self, record: &SignatureRecord) -> Result<Vec<u8>> {
        sidecar::encode(record)
    }

    /// Decode a sidecar, enforcing the configured size limit.
    pub fn decode_sidecar(&self, bytes: &[u8]) -> Result<SignatureRecord> {
        sidecar::decode_with_limit(bytes, self.config.max_sidecar_bytes)
    }

    /// Decode a current-format sidecar or import an unversioned one written
    /// by the legacy Python SDK.
    pub fn decode_sidecar_any(&self, bytes: &[u8]) -> Result<SignatureRecord> {
        sidecar::decode_any_with_limit(bytes, self.config.max_sidecar_bytes)
    }

    /// Read and decode a sidecar file without loading more than the size limit.
    pub fn read_sidecar(&self, path: &Path) -> Result<SignatureRecord> {
        self.decode_sidecar(&self.read_bounded(path)?)
    }

    /// [`Engine::read_sidecar`], also accepting the legacy unversioned format.
    pub fn read_sidecar_any(&self, path: &Path) -> Result<SignatureRecord> {
        self.decode_sidecar_any(&self.read_bounded(path)?)
    }

    fn read_bounded(&self, path: &Path) -> Result<Vec<u8>> {
        let max = self.config.max_sidecar_bytes;
        let mut bytes = Vec::new();
        File::open(path)?
            .take(max as u64 + 1)
            .read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    // ---------------------------------------------------------------------
    // Sealing
    // ---------------------------------------------------------------------

    /// Hash, sign and wrap `content` into a fresh record.
    pub fn seal(
        &self,
        content: &[u8],
        metadata: SidecarMetadata,
        keypair: &KeyPair,
    ) -> Result<SignatureRecord> {
        SealBuilder::new(content)
            .with_metadata(metadata)
            .build(keypair)
    }

    /// Seal a file and write its sidecar next to it.
    ///
    /// `file_name`, `file_size` and `content_type` are filled from the file
    /// when the caller left them unset. Returns the record and the sidecar
    /// path that was written.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn seal_file(
        &self,
        path: &Path,
        mut metadata: SidecarMetadata,
        keypair: &KeyPair,
    ) -> Result<(SignatureRecord, PathBuf)> {
        let file_size = std::fs::metadata(path)?.len();
        let content_hash = self.fingerprint_file(path)?;

        if metadata.file_name.is_none() {
            metadata.file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        metadata.file_size.get_or_insert(file_size);
        metadata
            .content_type
            .get_or_insert_with(|| ContentType::from_path(path));

        let record = SealBuilder::from_fingerprint(content_hash)
            .with_metadata(metadata)
            .build(keypair)?;

        let out = sidecar::sidecar_path(path);
        std::fs::write(&out, self.encode_sidecar(&record)?)?;
        info!(sidecar = %out.display(), id = %record.id, "Wrote sidecar");
        Ok((record, out))
    }

    /// Verify a file against its sidecar.
    ///
    /// With no explicit sidecar path, `<file>.originmark.json` is used.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn verify_file(&self, path: &Path, sidecar: Option<&Path>) -> Result<VerificationOutcome> {
        let sidecar = sidecar
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sidecar::sidecar_path(path));
        let record = self.read_sidecar_any(&sidecar)?;
        let actual = self.fingerprint_file(path)?;
        Ok(verifier::verify_record_fingerprint(&record, &actual))
    }

    // ---------------------------------------------------------------------
    // Batching
    // ---------------------------------------------------------------------

    pub fn open_batch(&self) -> Result<SignatureBatch> {
        SignatureBatch::open()
    }

    pub fn verify_inclusion(
        &self,
        leaf: &ContentFingerprint,
        proof: &MerkleProof,
        root: &MerkleHash,
    ) -> bool {
        merkle::verify_inclusion(leaf, proof, root)
    }

    /// Inclusion check against a root anchored together with its entry count.
    pub fn verify_anchored_inclusion(
        &self,
        leaf: &ContentFingerprint,
        proof: &MerkleProof,
        root: &MerkleHash,
        entry_count: u64,
    ) -> bool {
        merkle::verify_anchored_inclusion(leaf, proof, root, entry_count)
    }
}
