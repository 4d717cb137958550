//! # Main — CLI Entry Point
//!
//! Routes subcommands to the library: probabilistic tests, Pratt
//! certificate generation, and certificate verification.
//!
//! ## Subcommands
//!
//! - `test <N>`: Fermat, Lehmann or Miller–Rabin verdict for `N`.
//! - `certify <PRIME>`: build a Pratt certificate and print or save the
//!   zero-padded JSON record.
//! - `verify <FILE>`: re-check a saved record.
//!
//! ## Global Options
//!
//! - `--seed` / `PRIMECERT_SEED`: reproducible witness sequence.
//! - `--threads`: Rayon thread pool size (0 = all cores), used by `test --parallel`.
//! - `LOG_FORMAT=json` switches logs to JSON; `RUST_LOG` filters them.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use primecert::TestKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "primecert", about = "Probabilistic primality tests and Pratt certificates")]
struct Cli {
    /// Seed for witness sampling (random per run when unset)
    #[arg(long, env = "PRIMECERT_SEED", global = true)]
    seed: Option<u64>,

    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a probabilistic primality test
    Test {
        /// Candidate (decimal, arbitrary precision)
        n: String,
        /// Test to run
        #[arg(long, value_enum, default_value_t = TestKind::MillerRabin)]
        method: TestKind,
        /// Trial count (default: 5 for fermat/lehmann, 10 for miller-rabin)
        #[arg(long)]
        rounds: Option<u32>,
        /// Evaluate trials across the rayon pool
        #[arg(long)]
        parallel: bool,
        /// Print a JSON object instead of a sentence
        #[arg(long)]
        json: bool,
    },
    /// Build a Pratt primality certificate
    Certify {
        /// Prime to certify (decimal, arbitrary precision)
        prime: String,
        /// Factor slots per certificate prime
        #[arg(long, default_value_t = 6)]
        max_factors: usize,
        /// Certificate prime slots
        #[arg(long, default_value_t = 6)]
        max_primes: usize,
        /// Base recorded as metadata in the output record
        #[arg(long, default_value = "2")]
        base: String,
        /// Write the record here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Verify a saved certificate record
    Verify {
        /// Path to the JSON record
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize structured logging: LOG_FORMAT=json for machine consumption, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::configure_rayon(cli.threads);

    match &cli.command {
        Commands::Test {
            n,
            method,
            rounds,
            parallel,
            json,
        } => cli::run_test(&cli, n, *method, *rounds, *parallel, *json),
        Commands::Certify {
            prime,
            max_factors,
            max_primes,
            base,
            output,
        } => cli::run_certify(prime, *max_factors, *max_primes, base, output.as_deref()),
        Commands::Verify { file } => cli::run_verify(file),
    }
}
