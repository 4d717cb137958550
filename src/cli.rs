//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Parses candidate
//! numbers, wires the witness source, runs the library operation, and
//! prints results to stdout (logs go to stderr).

use anyhow::{anyhow, Context, Result};
use primecert::{
    build_certificate, output, run_test as run_probable_test, run_test_parallel,
    verify_certificate, CertificateBounds, RandWitnesses, TestKind, Verdict,
};
use rug::Integer;
use std::path::Path;
use tracing::{info, warn};

use super::Cli;

/// Parse a decimal candidate, rejecting anything that is not an integer.
fn parse_candidate(raw: &str) -> Result<Integer> {
    raw.trim()
        .parse::<Integer>()
        .map_err(|_| anyhow!("Not an integer: {:?}", raw))
}

fn witness_source(seed: Option<u64>) -> RandWitnesses {
    match seed {
        Some(seed) => RandWitnesses::seeded(seed),
        None => RandWitnesses::new(),
    }
}

// ── Probabilistic Tests ─────────────────────────────────────────

pub fn run_test(
    cli: &Cli,
    raw: &str,
    kind: TestKind,
    rounds: Option<u32>,
    parallel: bool,
    json: bool,
) -> Result<()> {
    let n = parse_candidate(raw)?;
    let rounds = rounds.unwrap_or_else(|| kind.default_rounds());
    let mut source = witness_source(cli.seed);

    let start = std::time::Instant::now();
    let verdict = if parallel {
        run_test_parallel(kind, &n, rounds, &mut source)?
    } else {
        run_probable_test(kind, &n, rounds, &mut source)?
    };
    info!(
        test = kind.name(),
        rounds,
        bits = n.significant_bits(),
        parallel,
        elapsed_ms = start.elapsed().as_millis() as u64,
        ?verdict,
        "test complete"
    );

    if json {
        let out = serde_json::json!({
            "n": n.to_string(),
            "test": kind.name(),
            "rounds": rounds,
            "verdict": verdict,
        });
        println!("{}", out);
    } else {
        let label = match verdict {
            Verdict::ProbablyPrime => "probably prime",
            Verdict::Composite => "composite",
        };
        println!("{} is {} ({}, {} rounds)", n, label, kind.name(), rounds);
    }
    Ok(())
}

// ── Certificates ────────────────────────────────────────────────

pub fn run_certify(
    raw: &str,
    max_factors: usize,
    max_primes: usize,
    raw_base: &str,
    output_path: Option<&Path>,
) -> Result<()> {
    let prime = parse_candidate(raw)?;
    let base = parse_candidate(raw_base).context("--base")?;
    let bounds = CertificateBounds::new(max_factors, max_primes)?;

    let cert = build_certificate(&prime, bounds)?;
    let report = verify_certificate(&cert)?;
    if !report.complete {
        warn!(
            nodes = report.nodes_checked,
            "certificate is incomplete; raise --max-factors or --max-primes for a full proof"
        );
    }

    let record = cert.to_record(&base);
    match output_path {
        Some(path) => {
            output::save(path, &record)?;
            info!(path = %path.display(), nodes = cert.nodes().len(), "certificate written");
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}

pub fn run_verify(path: &Path) -> Result<()> {
    let record = output::load(path)?;
    let cert = record.to_certificate()?;
    let report = verify_certificate(&cert)
        .with_context(|| format!("certificate for {} failed verification", cert.root()))?;

    println!(
        "{}: valid ({} primes checked, {})",
        cert.root(),
        report.nodes_checked,
        if report.complete {
            "complete proof"
        } else {
            "incomplete proof"
        }
    );
    Ok(())
}

// ── Rayon ───────────────────────────────────────────────────────

/// Configure the global rayon pool size. `None` or 0 keeps rayon's default.
pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
