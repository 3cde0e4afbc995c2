//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use originmark_core::OriginMarkError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (verification failed, tampered content, corrupt sidecar).
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Marker error for a completed check whose answer was "no".
#[derive(Debug)]
pub struct VerificationFailure(pub String);

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Verification failed: {}", self.0)
    }
}

impl std::error::Error for VerificationFailure {}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        Self {
            code: classify(err, &message),
            message: Some(message),
        }
    }
}

fn classify(err: &anyhow::Error, message: &str) -> i32 {
    // Typed causes first, then the context strings attached by commands.
    for cause in err.chain() {
        if cause.is::<VerificationFailure>() {
            return VERIFICATION_FAILED;
        }
        if let Some(core) = cause.downcast_ref::<OriginMarkError>() {
            match core {
                OriginMarkError::TruncatedOrCorrupt(_)
                | OriginMarkError::UnsupportedFormatVersion { .. }
                | OriginMarkError::SidecarTooLarge { .. }
                | OriginMarkError::MalformedFingerprint(_)
                | OriginMarkError::MalformedKeyEncoding(_)
                | OriginMarkError::InvalidSeedLength { .. }
                | OriginMarkError::KeyMismatch => return VERIFICATION_FAILED,
                _ => {}
            }
        }
    }

    if message.starts_with("Failed to read") {
        INPUT_ERROR
    } else if message.starts_with("Failed to write") {
        IO_ERROR
    } else {
        GENERAL_ERROR
    }
}
