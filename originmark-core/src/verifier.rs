//! Signature and content verification.
//!
//! Verification is two-staged. The fingerprint is first re-derived from the
//! bytes supplied at verify time and compared with the record; only a match
//! proceeds to the Ed25519 check. A record is never validated on the strength
//! of its own `content_hash` field.

use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::hash::{fingerprint, ContentFingerprint};
use crate::keys::PublicKey;
use crate::sidecar::SignatureRecord;
use crate::signer::{signed_message, SIGNATURE_BYTES};

/// Outcome of checking a signature over a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    InvalidSignature,
    MalformedSignature,
    MalformedPublicKey,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Valid => "Signature valid",
            Verdict::InvalidSignature => "Signature does not match this key and content hash",
            Verdict::MalformedSignature => "Signature is malformed",
            Verdict::MalformedPublicKey => "Public key is malformed",
        }
    }
}

/// Outcome of verifying a sidecar record against content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Content matches the sealed fingerprint and the signature is valid.
    Authentic,
    /// The supplied content is not the content that was sealed.
    ContentMismatch {
        expected: ContentFingerprint,
        actual: ContentFingerprint,
    },
    /// Content matches but the seal itself is broken.
    SignatureRejected { verdict: Verdict },
}

impl VerificationOutcome {
    pub fn is_authentic(&self) -> bool {
        matches!(self, VerificationOutcome::Authentic)
    }

    pub fn description(&self) -> &'static str {
        match self {
            VerificationOutcome::Authentic => "Content matches the sealed original",
            VerificationOutcome::ContentMismatch { .. } => {
                "This file does not match the sealed original"
            }
            VerificationOutcome::SignatureRejected { verdict } => verdict.description(),
        }
    }
}

/// Check `signature` over `fingerprint` under raw `public_key` bytes.
///
/// Length and point validity are checked before any signature arithmetic.
pub fn verify(fingerprint: &ContentFingerprint, signature: &[u8], public_key: &[u8]) -> Verdict {
    if signature.len() != SIGNATURE_BYTES {
        return Verdict::MalformedSignature;
    }
    let Ok(signature) = Signature::from_slice(signature) else {
        return Verdict::MalformedSignature;
    };
    let Ok(public_key) = PublicKey::from_bytes(public_key) else {
        return Verdict::MalformedPublicKey;
    };
    verify_with_key(fingerprint, &signature, &public_key)
}

fn verify_with_key(
    fingerprint: &ContentFingerprint,
    signature: &Signature,
    public_key: &PublicKey,
) -> Verdict {
    match public_key
        .verifying_key()
        .verify_strict(&signed_message(fingerprint), signature)
    {
        Ok(()) => Verdict::Valid,
        Err(_) => Verdict::InvalidSignature,
    }
}

/// Verify a record against the content it claims to seal.
pub fn verify_record(record: &SignatureRecord, content: &[u8]) -> VerificationOutcome {
    verify_record_fingerprint(record, &fingerprint(content))
}

/// Verify a record against a fingerprint the caller computed from actual
/// content bytes, e.g. by streaming a large file through
/// [`FingerprintHasher`](crate::hash::FingerprintHasher).
#[instrument(level = "debug", skip_all, fields(record_id = %record.id, actual = %actual))]
pub fn verify_record_fingerprint(
    record: &SignatureRecord,
    actual: &ContentFingerprint,
) -> VerificationOutcome {
    if record.content_hash != *actual {
        debug!(expected = %record.content_hash, "Content fingerprint mismatch");
        return VerificationOutcome::ContentMismatch {
            expected: record.content_hash,
            actual: *actual,
        };
    }

    match verify(&record.content_hash, &record.signature, &record.public_key) {
        Verdict::Valid => VerificationOutcome::Authentic,
        verdict => {
            debug!(?verdict, "Signature rejected");
            VerificationOutcome::SignatureRejected { verdict }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use crate::signer::sign;

    fn pair(seed: u8) -> KeyPair {
        KeyPair::from_seed(&[seed; 32]).unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = pair(1);
        let fp = fingerprint(b"roundtrip");
        let sig = sign(&fp, &kp);
        assert_eq!(
            verify(&fp, &sig, &kp.public_key().to_bytes()),
            Verdict::Valid
        );
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let fp = fingerprint(b"content");
        let sig = sign(&fp, &pair(1));
        assert_eq!(
            verify(&fp, &sig, &pair(2).public_key().to_bytes()),
            Verdict::InvalidSignature
        );
    }

    #[test]
    fn test_wrong_fingerprint_is_invalid_signature() {
        let kp = pair(1);
        let sig = sign(&fingerprint(b"one"), &kp);
        assert_eq!(
            verify(&fingerprint(b"two"), &sig, &kp.public_key().to_bytes()),
            Verdict::InvalidSignature
        );
    }

    #[test]
    fn test_flipped_signature_bit_is_invalid() {
        let kp = pair(1);
        let fp = fingerprint(b"content");
        let mut sig = sign(&fp, &kp);
        sig[10] ^= 0x04;
        assert_eq!(
            verify(&fp, &sig, &kp.public_key().to_bytes()),
            Verdict::InvalidSignature
        );
    }

    #[test]
    fn test_signature_length_checked_first() {
        let kp = pair(1);
        let fp = fingerprint(b"content");
        let sig = sign(&fp, &kp);
        assert_eq!(
            verify(&fp, &sig[..63], &kp.public_key().to_bytes()),
            Verdict::MalformedSignature
        );
        assert_eq!(verify(&fp, &[], &[]), Verdict::MalformedSignature);
    }

    #[test]
    fn test_public_key_length_checked() {
        let kp = pair(1);
        let fp = fingerprint(b"content");
        let sig = sign(&fp, &kp);
        assert_eq!(
            verify(&fp, &sig, &kp.public_key().to_bytes()[..31]),
            Verdict::MalformedPublicKey
        );
    }

    #[test]
    fn test_outcome_descriptions_differ() {
        let fp = fingerprint(b"x");
        let mismatch = VerificationOutcome::ContentMismatch {
            expected: fp,
            actual: fp,
        };
        let broken = VerificationOutcome::SignatureRejected {
            verdict: Verdict::InvalidSignature,
        };
        assert_ne!(mismatch.description(), broken.description());
        assert!(!mismatch.is_authentic());
        assert!(VerificationOutcome::Authentic.is_authentic());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(VerificationOutcome::SignatureRejected {
            verdict: Verdict::MalformedPublicKey,
        })
        .unwrap();
        assert_eq!(json["status"], "signature_rejected");
        assert_eq!(json["verdict"], "malformed_public_key");
    }
}
