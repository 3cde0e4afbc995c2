//! OriginMark CLI - Content signing and offline verification tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod manifest;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments)
  65  Verification failed (tampered content, bad signature, corrupt sidecar)
  66  Input file not found or unreadable
  74  Output file could not be written";

#[derive(Parser)]
#[command(name = "originmark")]
#[command(author, version, about = "Digital signature verification for AI content", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Enable debug logging to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Sidecar format discriminator recorded in metadata.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    C2pa,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new Ed25519 key pair
    #[command(visible_alias = "generate-keys")]
    Keygen {
        /// Write the key pair to a JSON key file (owner-only permissions)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Derive the key pair from a 32-byte hex seed instead of the OS RNG
        #[arg(long, value_name = "HEX")]
        seed: Option<String>,
    },

    /// Sign a file and write <FILE>.originmark.json next to it
    Sign {
        /// Path to the file to sign
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// AI model or generation process used
        #[arg(long)]
        model: Option<String>,

        /// Base64 private key (32-byte seed or 64-byte seed||public)
        #[arg(long, env = "ORIGINMARK_PRIVATE_KEY", hide_env_values = true, conflicts_with = "key_file")]
        private_key: Option<String>,

        /// Load the private key from a key file written by `keygen --output`
        #[arg(long, value_name = "PATH")]
        key_file: Option<PathBuf>,

        /// Save the generated key pair when no key was supplied
        #[arg(long, value_name = "PATH")]
        save_key: Option<PathBuf>,

        /// Sidecar format discriminator
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Show what would be signed without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify a file against its sidecar
    Verify {
        /// Path to the signed file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the sidecar (defaults to <FILE>.originmark.json)
        #[arg(short, long, value_name = "SIDECAR")]
        sidecar: Option<PathBuf>,

        /// Print the verification outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display signature details from a sidecar file
    #[command(visible_alias = "show-signature")]
    Show {
        /// Path to the sidecar file
        #[arg(value_name = "SIDECAR")]
        sidecar: PathBuf,

        /// Print the canonical sidecar JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Aggregate sidecars into a Merkle batch and write a manifest
    Batch {
        /// Sidecar files to include, in order
        #[arg(value_name = "SIDECAR", required = true)]
        sidecars: Vec<PathBuf>,

        /// Path of the manifest to write
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Check that a sidecar is included in a batch manifest
    Prove {
        /// Sidecar to look up
        #[arg(value_name = "SIDECAR")]
        sidecar: PathBuf,

        /// Batch manifest written by `batch`
        #[arg(short, long, value_name = "PATH")]
        manifest: PathBuf,

        /// Expected Merkle root (hex), e.g. the externally anchored value
        #[arg(long, value_name = "HEX")]
        root: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("originmark=debug,originmark_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Keygen { output, seed } => commands::keygen::execute(output, seed, quiet),
        Commands::Sign {
            file,
            author,
            model,
            private_key,
            key_file,
            save_key,
            format,
            dry_run,
        } => commands::sign::execute(
            commands::sign::SignArgs {
                file,
                author,
                model,
                private_key,
                key_file,
                save_key,
                format,
                dry_run,
            },
            quiet,
        ),
        Commands::Verify {
            file,
            sidecar,
            json,
        } => commands::verify::execute(file, sidecar, json, quiet),
        Commands::Show { sidecar, json } => commands::show::execute(sidecar, json),
        Commands::Batch { sidecars, output } => commands::batch::execute(sidecars, output, quiet),
        Commands::Prove {
            sidecar,
            manifest,
            root,
        } => commands::prove::execute(sidecar, manifest, root, quiet),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
