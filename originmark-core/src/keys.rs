//! Ed25519 key pair management.
//!
//! Keys are exchanged as standard base64 (RFC 4648 alphabet, canonical
//! padding). Private keys export as the 32-byte seed; on import the 64-byte
//! `seed || public` layout used by libsodium-style tooling is also accepted
//! and checked for consistency.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{OriginMarkError, Result};

/// Ed25519 seed length.
pub const SECRET_KEY_BYTES: usize = 32;

/// Ed25519 public key length.
pub const PUBLIC_KEY_BYTES: usize = 32;

/// Length of the `seed || public` secret key layout.
pub const KEYPAIR_BYTES: usize = SECRET_KEY_BYTES + PUBLIC_KEY_BYTES;

/// An Ed25519 signing key pair. The secret half is zeroized on drop.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the operating system CSPRNG.
    ///
    /// Fails with [`OriginMarkError::KeyGenerationFailed`] if the OS cannot
    /// supply entropy. There is no fallback source.
    pub fn generate() -> Result<Self> {
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_BYTES]);
        getrandom::fill(&mut *seed)
            .map_err(|e| OriginMarkError::KeyGenerationFailed(e.to_string()))?;
        let pair = Self {
            signing_key: SigningKey::from_bytes(&seed),
        };
        debug!(key_id = %pair.public_key().key_id(), "Generated Ed25519 key pair");
        Ok(pair)
    }

    /// Deterministically derive a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let bytes: &[u8; SECRET_KEY_BYTES] =
            seed.try_into().map_err(|_| OriginMarkError::InvalidSeedLength {
                expected: SECRET_KEY_BYTES,
                actual: seed.len(),
            })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(bytes),
        })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Base64 of the 32-byte seed. The returned string is zeroized on drop.
    pub fn export_private(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(BASE64.encode(seed.as_slice()))
    }

    pub fn export_public(&self) -> String {
        self.public_key().export()
    }

    /// Import a base64 private key (32-byte seed or 64-byte `seed || public`).
    pub fn import_private(encoded: &str) -> Result<Self> {
        let raw = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|_| {
            OriginMarkError::MalformedKeyEncoding("private key is not valid base64".into())
        })?);

        match raw.len() {
            SECRET_KEY_BYTES => Self::from_seed(&raw),
            KEYPAIR_BYTES => {
                let pair = Self::from_seed(&raw[..SECRET_KEY_BYTES])?;
                if pair.public_key().to_bytes()[..] != raw[SECRET_KEY_BYTES..] {
                    return Err(OriginMarkError::KeyMismatch);
                }
                Ok(pair)
            }
            len => Err(OriginMarkError::MalformedKeyEncoding(format!(
                "private key must decode to {SECRET_KEY_BYTES} or {KEYPAIR_BYTES} bytes, got {len}"
            ))),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A validated Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse raw public key bytes. The point must decompress on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; PUBLIC_KEY_BYTES] = bytes.try_into().map_err(|_| {
            OriginMarkError::MalformedKeyEncoding(format!(
                "public key must be {PUBLIC_KEY_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        VerifyingKey::from_bytes(bytes).map(Self).map_err(|_| {
            OriginMarkError::MalformedKeyEncoding("public key is not a valid curve point".into())
        })
    }

    pub fn import(encoded: &str) -> Result<Self> {
        let raw = BASE64.decode(encoded.trim()).map_err(|_| {
            OriginMarkError::MalformedKeyEncoding("public key is not valid base64".into())
        })?;
        Self::from_bytes(&raw)
    }

    pub fn export(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_BYTES] {
        self.0.to_bytes()
    }

    /// Hex SHA-256 of the public key bytes, used as a stable signer identity.
    pub fn key_id(&self) -> String {
        key_id_for(self.0.as_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// Key id of raw public key bytes, as [`PublicKey::key_id`] computes it.
/// Defined for any bytes so records carrying a malformed key still get one.
pub fn key_id_for(public_key: &[u8]) -> String {
    hex::encode(Sha256::digest(public_key))
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.export())
    }
}

/// On-disk key pair representation. Both strings are wiped on drop.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyFile {
    pub private_key: String,
    pub public_key: String,
}

impl KeyFile {
    pub fn from_keypair(pair: &KeyPair) -> Self {
        Self {
            private_key: pair.export_private().to_string(),
            public_key: pair.export_public(),
        }
    }

    /// Rebuild the key pair, checking that the stored public key matches.
    pub fn to_keypair(&self) -> Result<KeyPair> {
        let pair = KeyPair::import_private(&self.private_key)?;
        let stored = PublicKey::import(&self.public_key)?;
        if stored != pair.public_key() {
            return Err(OriginMarkError::KeyMismatch);
        }
        Ok(pair)
    }

    /// Load and validate a key file.
    pub fn load(path: &Path) -> Result<KeyPair> {
        let bytes = Zeroizing::new(std::fs::read(path)?);
        let file: KeyFile = serde_json::from_slice(&bytes).map_err(|e| {
            OriginMarkError::MalformedKeyEncoding(format!("invalid key file structure: {e}"))
        })?;
        file.to_keypair()
    }

    /// Write a key pair to `path`, readable by the owner only on Unix.
    pub fn save(pair: &KeyPair, path: &Path) -> Result<()> {
        use std::io::Write;

        let file = Self::from_keypair(pair);
        let json = Zeroizing::new(
            serde_json::to_vec_pretty(&file)
                .map_err(|e| OriginMarkError::Serialization(format!("key file: {e}")))?,
        );

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut out = options.open(path)?;
        // The creation mode does not apply to a file that already exists.
        // Tighten it before any key material is written.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            out.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        out.write_all(&json)?;
        debug!(path = %path.display(), key_id = %pair.public_key().key_id(), "Key file written");
        Ok(())
    }
}
