#![no_main]

//! Fuzz target for `sidecar::decode()` and the legacy import
//!
//! Arbitrary bytes must decode to a record or a typed error, never a panic.
//! A record that does decode, through either path, must re-encode and
//! strictly decode to itself.
//!
//! Run with: cargo +nightly fuzz run fuzz_decode_sidecar

use libfuzzer_sys::fuzz_target;
use originmark_core::{sidecar, MAX_SIDECAR_SIZE};

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = sidecar::decode_any_with_limit(data, MAX_SIDECAR_SIZE) {
        let encoded = sidecar::encode(&record).expect("decoded record re-encodes");
        let again = sidecar::decode(&encoded).expect("re-encoded record decodes");
        assert_eq!(again, record);
    }
});
