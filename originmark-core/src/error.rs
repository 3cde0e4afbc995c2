use thiserror::Error;

/// Current sidecar format version written by the codec.
pub const CURRENT_SIDECAR_VERSION: u32 = 1;

/// Default upper bound on sidecar size accepted by the decoder (1 MiB).
pub const MAX_SIDECAR_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum OriginMarkError {
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Invalid seed length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },

    #[error("Malformed key encoding: {0}")]
    MalformedKeyEncoding(String),

    #[error("Private key does not correspond to the embedded public key")]
    KeyMismatch,

    #[error("Malformed fingerprint: {0}")]
    MalformedFingerprint(String),

    #[error("Unsupported sidecar format version {found} (supported: {supported})")]
    UnsupportedFormatVersion { found: u64, supported: u32 },

    #[error("Truncated or corrupt sidecar: {0}")]
    TruncatedOrCorrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sidecar too large: {size} bytes (max: {max})")]
    SidecarTooLarge { size: usize, max: usize },

    #[error("Batch {batch_id} is already finalized")]
    BatchAlreadyFinalized { batch_id: String },

    #[error("Batch {batch_id} is not yet finalized")]
    BatchNotYetFinalized { batch_id: String },

    #[error("Cannot finalize empty batch {batch_id}")]
    EmptyBatch { batch_id: String },

    #[error("Entry index {index} out of range for batch of {len} entries")]
    IndexOutOfRange { index: u64, len: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OriginMarkError>;
