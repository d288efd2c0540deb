//! Multisig Account CLI
//!
//! Command-line tooling for the threshold-signature account core.

use clap::{Parser, Subcommand};
use multisig_account::cli::commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "account")]
#[command(version = "0.2.0")]
#[command(about = "Threshold-signature account tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate signer key pairs
    Keygen {
        /// Number of key pairs to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },

    /// Print the canonical hash of a JSON request file
    Hash {
        /// Path to the request file
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Sign a request hash with a private key
    Sign {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,

        /// Hex-encoded request hash
        #[arg(long)]
        hash: String,
    },

    /// Run a scripted end-to-end scenario on the in-memory host
    Demo,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { count } => commands::keygen(count),
        Commands::Hash { request } => commands::hash_request(&request),
        Commands::Sign { key, hash } => commands::sign(&key, &hash),
        Commands::Demo => commands::demo(),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
