//! CLI integration tests for originmark-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Seed `[7u8; 32]` and the key pair it derives.
const SEED_HEX: &str = "0707070707070707070707070707070707070707070707070707070707070707";
const SEED_PRIVATE_B64: &str = "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=";
const SEED_PUBLIC_B64: &str = "6kpsY+KcUgq+9VB7Ey7F+ZVHdq6+vnuSQh7qaRRG0iw=";

/// Get a Command for the originmark binary.
fn originmark() -> Command {
    let mut cmd = Command::cargo_bin("originmark").unwrap();
    cmd.env_remove("ORIGINMARK_PRIVATE_KEY")
        .env_remove("ORIGINMARK_MAX_SIDECAR_BYTES")
        .env_remove("ORIGINMARK_HASH_CHUNK_SIZE")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    originmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Digital signature verification for AI content",
        ))
        .stdout(predicate::str::contains("keygen"))
        .stdout(predicate::str::contains("sign"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("prove"));
}

#[test]
fn test_version_displays_version() {
    originmark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("originmark"));
}

#[test]
fn test_help_shows_exit_codes() {
    originmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_sign_help_shows_options() {
    originmark()
        .args(["sign", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--author"))
        .stdout(predicate::str::contains("--model"))
        .stdout(predicate::str::contains("--private-key"))
        .stdout(predicate::str::contains("--key-file"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_verify_help_shows_options() {
    originmark()
        .args(["verify", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FILE"))
        .stdout(predicate::str::contains("--sidecar"));
}

#[test]
fn test_legacy_command_aliases() {
    originmark().args(["generate-keys", "--help"]).assert().success();
    originmark().args(["show-signature", "--help"]).assert().success();
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_unknown_argument_returns_usage_error() {
    // Exit code 64 = EX_USAGE
    originmark()
        .args(["sign", "--no-such-flag", "x.txt"])
        .assert()
        .code(64);
}

#[test]
fn test_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    originmark()
        .args(["sign", "nonexistent_file.txt"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_missing_sidecar_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test.txt");
    fs::write(&test_file, b"test content").unwrap();

    originmark()
        .args(["verify", test_file.to_str().unwrap()])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read sidecar file"));
}

#[test]
fn test_invalid_sidecar_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test.txt");
    let sidecar = temp.path().join("test.txt.originmark.json");

    fs::write(&test_file, b"test content").unwrap();
    fs::write(&sidecar, b"invalid sidecar data").unwrap();

    originmark()
        .args(["verify", test_file.to_str().unwrap()])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Failed to parse sidecar"));
}

#[test]
fn test_future_sidecar_version_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test.txt");
    fs::write(&test_file, b"content").unwrap();

    originmark()
        .args(["-q", "sign", "--private-key", SEED_PRIVATE_B64, test_file.to_str().unwrap()])
        .assert()
        .success();

    let sidecar = temp.path().join("test.txt.originmark.json");
    let text = fs::read_to_string(&sidecar).unwrap();
    fs::write(&sidecar, text.replace("\"version\": 1", "\"version\": 2")).unwrap();

    originmark()
        .args(["verify", test_file.to_str().unwrap()])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Unsupported sidecar format version 2"));
}

#[test]
fn test_invalid_private_key_is_rejected() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test.txt");
    fs::write(&test_file, b"content").unwrap();

    originmark()
        .args(["sign", "--private-key", "not-base64!", test_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid private key"));
    assert!(!temp.path().join("test.txt.originmark.json").exists());
}

// ============================================================================
// Keygen Tests
// ============================================================================

#[test]
fn test_keygen_prints_keys() {
    originmark()
        .arg("keygen")
        .assert()
        .success()
        .stdout(predicate::str::contains("private_key:"))
        .stdout(predicate::str::contains("public_key:"));
}

#[test]
fn test_keygen_from_seed_is_deterministic() {
    originmark()
        .args(["keygen", "--seed", SEED_HEX])
        .assert()
        .success()
        .stdout(predicate::str::contains(SEED_PRIVATE_B64))
        .stdout(predicate::str::contains(SEED_PUBLIC_B64));
}

#[test]
fn test_keygen_rejects_short_seed() {
    originmark()
        .args(["keygen", "--seed", "0707"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Seed must be 32 bytes"));
}

#[test]
fn test_keygen_writes_key_file() {
    let temp = TempDir::new().unwrap();
    let key_file = temp.path().join("alice.key.json");

    originmark()
        .args(["keygen", "--seed", SEED_HEX, "--output", key_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Key file:"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&key_file).unwrap()).unwrap();
    assert_eq!(json["private_key"], SEED_PRIVATE_B64);
    assert_eq!(json["public_key"], SEED_PUBLIC_B64);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&key_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

// ============================================================================
// Sign Tests
// ============================================================================

#[test]
fn test_sign_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("note.txt");
    fs::write(&test_file, b"Hello from OriginMark").unwrap();

    originmark()
        .args(["sign", "--dry-run", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains(
            "f7a445d3d4d272b559a07c8e3fb6e2d9a289a1054611ee8aea8558ba92b6f6da",
        ));

    assert!(!temp.path().join("note.txt.originmark.json").exists());
}

#[test]
fn test_sign_writes_sidecar_with_metadata() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("story.txt");
    fs::write(&test_file, b"Hello from OriginMark").unwrap();

    originmark()
        .args([
            "sign",
            "--author",
            "Alice",
            "--model",
            "GPT-4",
            "--private-key",
            SEED_PRIVATE_B64,
            test_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("File signed!"));

    let sidecar = temp.path().join("story.txt.originmark.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(
        json["content_hash"],
        "f7a445d3d4d272b559a07c8e3fb6e2d9a289a1054611ee8aea8558ba92b6f6da"
    );
    assert_eq!(json["public_key"], SEED_PUBLIC_B64);
    assert_eq!(json["metadata"]["author"], "Alice");
    assert_eq!(json["metadata"]["model_used"], "GPT-4");
    assert_eq!(json["metadata"]["file_name"], "story.txt");
    assert_eq!(json["metadata"]["file_size"], 21);
    assert_eq!(json["metadata"]["content_type"], "text");
    assert!(json["metadata"].get("format").is_none());
}

#[test]
fn test_sign_private_key_from_env() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("env.txt");
    fs::write(&test_file, b"env key").unwrap();

    originmark()
        .env("ORIGINMARK_PRIVATE_KEY", SEED_PRIVATE_B64)
        .args(["-q", "sign", test_file.to_str().unwrap()])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("env.txt.originmark.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["public_key"], SEED_PUBLIC_B64);
}

#[test]
fn test_sign_c2pa_format_recorded() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("img.png");
    fs::write(&test_file, b"pixels").unwrap();

    originmark()
        .args(["sign", "--format", "c2pa", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("C2PA"));

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("img.png.originmark.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["metadata"]["format"], "c2pa");
    assert_eq!(json["metadata"]["content_type"], "image");
}

#[test]
fn test_sign_without_key_warns_about_ephemeral_key() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("a.txt");
    fs::write(&test_file, b"a").unwrap();

    originmark()
        .args(["sign", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("ephemeral key"));
}

// ============================================================================
// Quiet and Verbose Mode Tests
// ============================================================================

#[test]
fn test_quiet_mode_suppresses_output() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("quiet.txt");
    fs::write(&test_file, b"quiet").unwrap();

    originmark()
        .args(["--quiet", "sign", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    originmark()
        .args(["verify", "--quiet", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_verbose_logs_to_stderr() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("loud.txt");
    fs::write(&test_file, b"loud").unwrap();

    originmark()
        .args(["--verbose", "-q", "sign", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Sidecar saved"));
}

// ============================================================================
// Show Tests
// ============================================================================

#[test]
fn test_show_displays_details() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("doc.txt");
    fs::write(&test_file, b"doc").unwrap();

    originmark()
        .args([
            "-q",
            "sign",
            "--author",
            "Alice",
            "--private-key",
            SEED_PRIVATE_B64,
            test_file.to_str().unwrap(),
        ])
        .assert()
        .success();

    let sidecar = temp.path().join("doc.txt.originmark.json");
    originmark()
        .args(["show", sidecar.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains(SEED_PUBLIC_B64))
        .stdout(predicate::str::contains("Signature valid"));

    let canonical = fs::read_to_string(&sidecar).unwrap();
    originmark()
        .args(["show", "--json", sidecar.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::eq(canonical.as_str()));
}
