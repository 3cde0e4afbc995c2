//! Canonical content hashing.
//!
//! A [`ContentFingerprint`] is the SHA-256 digest of the exact content bytes.
//! No text decoding or re-encoding happens before hashing: callers hand over
//! bytes as read from disk or the network, and that is what gets hashed.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{OriginMarkError, Result};

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_BYTES: usize = 32;

/// Default read buffer used when hashing streams.
pub const DEFAULT_HASH_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 digest of canonical content bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint([u8; FINGERPRINT_BYTES]);

impl ContentFingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// Lowercase hex form, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest. Upper and lower case are both accepted.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != FINGERPRINT_BYTES * 2 {
            return Err(OriginMarkError::MalformedFingerprint(format!(
                "expected {} hex characters, got {}",
                FINGERPRINT_BYTES * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; FINGERPRINT_BYTES];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| OriginMarkError::MalformedFingerprint(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentFingerprint {
    type Err = OriginMarkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute the fingerprint of a complete byte sequence.
pub fn fingerprint(content: &[u8]) -> ContentFingerprint {
    let mut hasher = FingerprintHasher::new();
    hasher.update(content);
    hasher.finalize()
}

/// Incremental hasher for content that arrives in chunks.
///
/// Feeding the same bytes in any chunking yields the same fingerprint as
/// [`fingerprint`] over the concatenation.
#[derive(Clone, Default)]
pub struct FingerprintHasher {
    inner: Sha256,
    bytes_hashed: u64,
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.bytes_hashed += chunk.len() as u64;
    }

    /// Total number of bytes fed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    pub fn finalize(self) -> ContentFingerprint {
        ContentFingerprint(self.inner.finalize().into())
    }
}

/// Hash everything readable from `reader` using a bounded buffer.
pub fn fingerprint_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<ContentFingerprint> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut hasher = FingerprintHasher::new();
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Hash a file on disk without loading it fully into memory.
pub fn fingerprint_file(path: &Path, chunk_size: usize) -> Result<ContentFingerprint> {
    let file = std::fs::File::open(path)?;
    fingerprint_reader(file, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_known_digest() {
        assert_eq!(
            fingerprint(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_known_digest_abc() {
        assert_eq!(
            fingerprint(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let data = b"repeatable content";
        assert_eq!(fingerprint(data), fingerprint(data));
    }

    #[test]
    fn test_single_bit_flip_changes_fingerprint() {
        let original = b"Hello from OriginMark".to_vec();
        for i in 0..original.len() {
            let mut flipped = original.clone();
            flipped[i] ^= 0x01;
            assert_ne!(fingerprint(&original), fingerprint(&flipped), "byte {i}");
        }
    }

    #[test]
    fn test_non_ascii_bytes_are_hashed_verbatim() {
        // "café" as UTF-8 vs Latin-1: different bytes, different fingerprints.
        let utf8 = "café".as_bytes();
        let latin1 = [0x63, 0x61, 0x66, 0xE9];
        assert_ne!(fingerprint(utf8), fingerprint(&latin1));
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut hasher = FingerprintHasher::new();
        for chunk in data.chunks(777) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.bytes_hashed(), data.len() as u64);
        assert_eq!(hasher.finalize(), fingerprint(&data));
    }

    #[test]
    fn test_reader_matches_one_shot() {
        let data = vec![0xABu8; 200_000];
        let fp = fingerprint_reader(std::io::Cursor::new(&data), 4096).unwrap();
        assert_eq!(fp, fingerprint(&data));
    }

    #[test]
    fn test_hex_roundtrip_and_case() {
        let fp = fingerprint(b"hex");
        assert_eq!(ContentFingerprint::from_hex(&fp.to_hex()).unwrap(), fp);
        assert_eq!(
            ContentFingerprint::from_hex(&fp.to_hex().to_uppercase()).unwrap(),
            fp
        );
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            ContentFingerprint::from_hex("abcd"),
            Err(OriginMarkError::MalformedFingerprint(_))
        ));
        let not_hex = "z".repeat(64);
        assert!(matches!(
            ContentFingerprint::from_hex(&not_hex),
            Err(OriginMarkError::MalformedFingerprint(_))
        ));
    }
}
