//! Sidecar codec: the portable `*.originmark.json` signature artifact.
//!
//! The encoding is pretty-printed UTF-8 JSON with keys in lexicographic
//! order at every level, so two encodings of the same record are byte
//! identical. Decoding is strict: an unknown field, an unknown enum value or
//! a field that fails to parse rejects the whole document. JSON carries no
//! references or executable content, so nothing outside the input buffer is
//! consulted.
//!
//! Unversioned sidecars from the legacy Python SDK go through a separate
//! import, [`decode_legacy`].

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{OriginMarkError, Result, CURRENT_SIDECAR_VERSION, MAX_SIDECAR_SIZE};
use crate::hash::ContentFingerprint;

/// File name suffix appended to the sealed file's name.
pub const SIDECAR_SUFFIX: &str = ".originmark.json";

/// Kind of content that was sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    /// Infer from a file extension: known image extensions map to `Image`,
    /// everything else to `Text`.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp") => ContentType::Image,
            _ => ContentType::Text,
        }
    }
}

/// Which external representation the producer intends to export to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarFormat {
    Json,
    C2pa,
}

/// Descriptive, unauthenticated metadata carried by a sidecar.
///
/// Fields are declared in lexicographic order; the encoder relies on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidecarMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SidecarFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// A sealed signature record. Immutable once created; an edit to content
/// produces a new record rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub id: Uuid,
    pub content_hash: ContentFingerprint,
    /// Raw signature bytes. Length is checked at verification time.
    pub signature: Vec<u8>,
    /// Raw public key bytes. Length and point validity are checked at
    /// verification time.
    pub public_key: Vec<u8>,
    /// Signer's local clock. Not authenticated by the signature.
    pub timestamp: DateTime<Utc>,
    pub metadata: SidecarMetadata,
}

/// Wire form. Fields are in lexicographic order.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SidecarDocument {
    content_hash: String,
    id: String,
    metadata: SidecarMetadata,
    public_key: String,
    signature: String,
    timestamp: String,
    version: u32,
}

impl SignatureRecord {
    /// Base64 form of the public key, as written to the sidecar.
    pub fn public_key_b64(&self) -> String {
        BASE64.encode(&self.public_key)
    }

    pub fn signature_b64(&self) -> String {
        BASE64.encode(&self.signature)
    }

    fn to_document(&self) -> Result<SidecarDocument> {
        // RFC 3339 has four-digit years only; chrono would write `+10000-...`.
        let year = self.timestamp.year();
        if !(0..=9999).contains(&year) {
            return Err(OriginMarkError::Serialization(format!(
                "timestamp year {year} is outside RFC 3339 range"
            )));
        }
        Ok(SidecarDocument {
            content_hash: self.content_hash.to_hex(),
            id: self.id.hyphenated().to_string(),
            metadata: self.metadata.clone(),
            public_key: self.public_key_b64(),
            signature: self.signature_b64(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            version: CURRENT_SIDECAR_VERSION,
        })
    }

    fn from_document(doc: SidecarDocument) -> Result<Self> {
        let id = Uuid::parse_str(&doc.id)
            .map_err(|e| corrupt(format!("invalid id: {e}")))?;
        let content_hash = ContentFingerprint::from_hex(&doc.content_hash)
            .map_err(|e| corrupt(format!("invalid content_hash: {e}")))?;
        let signature = BASE64
            .decode(&doc.signature)
            .map_err(|e| corrupt(format!("invalid signature encoding: {e}")))?;
        let public_key = BASE64
            .decode(&doc.public_key)
            .map_err(|e| corrupt(format!("invalid public_key encoding: {e}")))?;
        let timestamp = parse_timestamp(&doc.timestamp)?;

        Ok(Self {
            id,
            content_hash,
            signature,
            public_key,
            timestamp,
            metadata: doc.metadata,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| corrupt(format!("invalid timestamp: {e}")))?
        .with_timezone(&Utc))
}

/// Unversioned document written by the legacy Python SDK.
///
/// Same fields as the current format minus `version`. Its metadata repeats
/// the timestamp, and for a freshly generated key the SDK also stored the
/// private key next to the signature. Both are accepted and discarded.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacySidecarDocument {
    content_hash: String,
    id: String,
    metadata: LegacyMetadata,
    public_key: String,
    signature: String,
    timestamp: String,
    #[serde(default)]
    private_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyMetadata {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content_type: Option<ContentType>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    format: Option<SidecarFormat>,
    #[serde(default)]
    model_used: Option<String>,
    #[serde(default, rename = "timestamp")]
    _timestamp: Option<String>,
}

impl LegacySidecarDocument {
    fn into_document(mut self) -> SidecarDocument {
        if self.private_key.is_some() {
            warn!(id = %self.id, "Legacy sidecar carries a private key; discarding it");
        }
        self.private_key.zeroize();
        let metadata = SidecarMetadata {
            author: self.metadata.author,
            content_type: self.metadata.content_type,
            file_name: self.metadata.file_name,
            file_size: self.metadata.file_size,
            format: self.metadata.format,
            model_used: self.metadata.model_used,
        };
        SidecarDocument {
            content_hash: self.content_hash,
            id: self.id,
            metadata,
            public_key: self.public_key,
            signature: self.signature,
            timestamp: self.timestamp,
            version: CURRENT_SIDECAR_VERSION,
        }
    }
}

fn corrupt(msg: impl Into<String>) -> OriginMarkError {
    OriginMarkError::TruncatedOrCorrupt(msg.into())
}

/// Encode a record as canonical sidecar JSON.
pub fn encode(record: &SignatureRecord) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(&record.to_document()?)
        .map_err(|e| OriginMarkError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode sidecar JSON with the default size limit.
pub fn decode(bytes: &[u8]) -> Result<SignatureRecord> {
    decode_with_limit(bytes, MAX_SIDECAR_SIZE)
}

/// Size, UTF-8 and JSON checks shared by every decoder. Returns the text
/// and its parsed top-level object.
fn parse_object(bytes: &[u8], max_size: usize) -> Result<(&str, serde_json::Value)> {
    if bytes.len() > max_size {
        return Err(OriginMarkError::SidecarTooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(corrupt("empty input"));
    }

    let text = std::str::from_utf8(bytes).map_err(|e| corrupt(format!("not UTF-8: {e}")))?;
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| corrupt(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(corrupt("top level is not an object"));
    }
    Ok((text, value))
}

/// Decode sidecar JSON, rejecting input larger than `max_size` bytes.
pub fn decode_with_limit(bytes: &[u8], max_size: usize) -> Result<SignatureRecord> {
    let (text, value) = parse_object(bytes, max_size)?;

    let version = value
        .get("version")
        .ok_or_else(|| corrupt("missing version"))?
        .as_u64()
        .ok_or_else(|| corrupt("version is not a non-negative integer"))?;
    if version != u64::from(CURRENT_SIDECAR_VERSION) {
        return Err(OriginMarkError::UnsupportedFormatVersion {
            found: version,
            supported: CURRENT_SIDECAR_VERSION,
        });
    }

    // Re-parse from text so duplicate keys are rejected instead of collapsed.
    let doc: SidecarDocument =
        serde_json::from_str(text).map_err(|e| corrupt(format!("invalid structure: {e}")))?;
    let record = SignatureRecord::from_document(doc)?;
    debug!(id = %record.id, content_hash = %record.content_hash, "Decoded sidecar");
    Ok(record)
}

/// Import an unversioned sidecar written by the legacy Python SDK, with
/// the default size limit.
pub fn decode_legacy(bytes: &[u8]) -> Result<SignatureRecord> {
    decode_legacy_with_limit(bytes, MAX_SIDECAR_SIZE)
}

/// Import an unversioned sidecar written by the legacy Python SDK.
///
/// A document that carries `version` is not a legacy sidecar and is
/// rejected; use [`decode_with_limit`] for it. Apart from the repeated
/// metadata timestamp and a stray private key, parsing is as strict as the
/// current format. Re-encoding the result yields a current-format sidecar.
pub fn decode_legacy_with_limit(bytes: &[u8], max_size: usize) -> Result<SignatureRecord> {
    let (text, value) = parse_object(bytes, max_size)?;
    if value.get("version").is_some() {
        return Err(corrupt("versioned document is not a legacy sidecar"));
    }

    let doc: LegacySidecarDocument =
        serde_json::from_str(text).map_err(|e| corrupt(format!("invalid legacy structure: {e}")))?;
    let record = SignatureRecord::from_document(doc.into_document())?;
    debug!(id = %record.id, content_hash = %record.content_hash, "Imported legacy sidecar");
    Ok(record)
}

/// Decode either format: a document with `version` goes through the
/// current decoder, an unversioned one through the legacy import.
pub fn decode_any_with_limit(bytes: &[u8], max_size: usize) -> Result<SignatureRecord> {
    let (_, value) = parse_object(bytes, max_size)?;
    if value.get("version").is_some() {
        decode_with_limit(bytes, max_size)
    } else {
        decode_legacy_with_limit(bytes, max_size)
    }
}

/// Conventional sidecar location for `file`: `<file>.originmark.json`.
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}
