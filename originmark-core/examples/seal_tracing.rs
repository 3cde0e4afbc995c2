//! Example demonstrating engine tracing instrumentation.
//!
//! Run with: cargo run -p originmark-core --example seal_tracing

use originmark_core::{Engine, EngineConfig, SidecarMetadata};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("originmark_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== OriginMark Tracing Demo ===\n");

    let engine = match Engine::init(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to initialize engine: {}", e);
            return;
        }
    };
    let keypair = match engine.generate_keypair() {
        Ok(kp) => kp,
        Err(e) => {
            eprintln!("Failed to generate key pair: {}", e);
            return;
        }
    };

    let metadata = SidecarMetadata {
        author: Some("Alice".to_string()),
        model_used: Some("GPT-4".to_string()),
        ..SidecarMetadata::default()
    };

    println!("Sealing content...\n");
    let record = match engine.seal(b"Hello from OriginMark", metadata, &keypair) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to seal: {}", e);
            return;
        }
    };

    println!("\nVerifying original and tampered content...\n");
    for content in [&b"Hello from OriginMark"[..], &b"Hello from OriginMark!"[..]] {
        let outcome = engine.verify_record(&record, content);
        println!("   {:?} -> {}", String::from_utf8_lossy(content), outcome.description());
    }

    let mut batch = match engine.open_batch() {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Failed to open batch: {}", e);
            return;
        }
    };
    for i in 0..5 {
        let fp = engine.compute_fingerprint(format!("item-{i}").as_bytes());
        if let Err(e) = batch.add_entry(fp) {
            eprintln!("Failed to add entry: {}", e);
            return;
        }
    }
    match batch.finalize() {
        Ok(summary) => {
            println!("\nBatch finalized");
            println!("   Entries: {}", summary.entry_count);
            println!("   Root:    {}", summary.merkle_root);
        }
        Err(e) => eprintln!("\nFailed to finalize batch: {}", e),
    }
}
