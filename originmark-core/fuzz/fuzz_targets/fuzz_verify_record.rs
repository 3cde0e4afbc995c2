#![no_main]

//! Fuzz target for record verification
//!
//! The first byte splits the input into sidecar bytes and content bytes.
//! Verification of any decodable sidecar against any content must return
//! an outcome without panicking.
//!
//! Run with: cargo +nightly fuzz run fuzz_verify_record

use libfuzzer_sys::fuzz_target;
use originmark_core::{sidecar, verify_record};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (content, sidecar_bytes) = rest.split_at(split);

    if let Ok(record) = sidecar::decode(sidecar_bytes) {
        let _ = verify_record(&record, content);
    }
});
