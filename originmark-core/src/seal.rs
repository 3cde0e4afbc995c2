//! Sealing: content bytes + metadata + key pair -> [`SignatureRecord`].

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{OriginMarkError, Result};
use crate::hash::{fingerprint, ContentFingerprint};
use crate::keys::KeyPair;
use crate::sidecar::{ContentType, SidecarFormat, SidecarMetadata, SignatureRecord};
use crate::signer::sign;

/// Builder for [`SignatureRecord`] instances.
#[derive(Debug, Clone)]
pub struct SealBuilder {
    content_hash: ContentFingerprint,
    metadata: SidecarMetadata,
    timestamp: Option<DateTime<Utc>>,
}

impl SealBuilder {
    /// Start a seal over the given content bytes.
    pub fn new(content: &[u8]) -> Self {
        Self::from_fingerprint(fingerprint(content))
    }

    /// Start a seal over a fingerprint computed elsewhere, e.g. by streaming.
    pub fn from_fingerprint(content_hash: ContentFingerprint) -> Self {
        Self {
            content_hash,
            metadata: SidecarMetadata::default(),
            timestamp: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.model_used = Some(model.into());
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.metadata.content_type = Some(content_type);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.metadata.file_name = Some(file_name.into());
        self
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.metadata.file_size = Some(file_size);
        self
    }

    pub fn with_format(mut self, format: SidecarFormat) -> Self {
        self.metadata.format = Some(format);
        self
    }

    /// Replace the whole metadata block.
    pub fn with_metadata(mut self, metadata: SidecarMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Pin the timestamp instead of reading the local clock.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn content_hash(&self) -> &ContentFingerprint {
        &self.content_hash
    }

    /// Sign and produce the record.
    pub fn build(self, keypair: &KeyPair) -> Result<SignatureRecord> {
        let id = random_id()?;
        let signature = sign(&self.content_hash, keypair);
        let record = SignatureRecord {
            id,
            content_hash: self.content_hash,
            signature: signature.to_vec(),
            public_key: keypair.public_key().to_bytes().to_vec(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            metadata: self.metadata,
        };
        debug!(
            id = %record.id,
            content_hash = %record.content_hash,
            key_id = %keypair.public_key().key_id(),
            "Sealed content"
        );
        Ok(record)
    }
}

/// RFC 4122 version 4 identifier drawn from the OS CSPRNG.
pub(crate) fn random_id() -> Result<Uuid> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).map_err(|e| OriginMarkError::EntropyUnavailable(e.to_string()))?;
    Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
}
