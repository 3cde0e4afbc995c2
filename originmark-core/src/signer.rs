//! Signature production over content fingerprints.

use ed25519_dalek::Signer;

use crate::hash::ContentFingerprint;
use crate::keys::KeyPair;

/// Ed25519 signature length.
pub const SIGNATURE_BYTES: usize = 64;

/// The exact bytes covered by a signature: the ASCII lowercase hex form of
/// the fingerprint. Sidecars from the Python SDK sign the same encoding.
pub fn signed_message(fingerprint: &ContentFingerprint) -> [u8; 64] {
    let mut message = [0u8; 64];
    // Infallible: the buffer is exactly twice the fingerprint length.
    let _ = hex::encode_to_slice(fingerprint.as_bytes(), &mut message);
    message
}

/// Sign a fingerprint. Ed25519 signing is deterministic, so identical
/// fingerprint and key always produce byte-identical signatures.
pub fn sign(fingerprint: &ContentFingerprint, keypair: &KeyPair) -> [u8; SIGNATURE_BYTES] {
    keypair
        .signing_key()
        .sign(&signed_message(fingerprint))
        .to_bytes()
}
