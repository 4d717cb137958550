//! # Probable — Probabilistic Primality Tests
//!
//! One trial driver, three per-trial predicates:
//!
//! - **Fermat**: witness `a` proves compositeness when `a^(n-1) ≢ 1 (mod n)`.
//!   Carmichael numbers satisfy the congruence for every base coprime to them
//!   and therefore pass every trial unless a sampled base shares a factor.
//! - **Lehmann**: `r = a^((n-1)/2) mod n`; compositeness when `r ∉ {1, n-1}`.
//!   Still fooled by composites such as 1729 and 2465, where every coprime
//!   base lands on ±1.
//! - **Miller–Rabin**: write `n-1 = d·2^r` with `d` odd, `x = a^d mod n`. The
//!   trial passes when `x ∈ {1, n-1}` or when one of the next `r-1` squarings
//!   reaches `n-1`. Each trial misses a composite with probability ≤ 1/4.
//!
//! ## Shared preamble
//!
//! `n = 1` is composite, `2` and `3` are prime without sampling, and even
//! `n > 2` is composite without sampling. Only odd `n ≥ 5` runs trials, with
//! witnesses drawn uniformly from `[2, n-2]`. The first witness of
//! compositeness ends the run.
//!
//! ## Parallel trials
//!
//! [`run_test_parallel`] draws the whole witness sequence first and evaluates
//! it across the rayon pool. "Any composite witness wins" makes the verdict
//! independent of evaluation order, so it matches [`run_test`] on the same
//! witness sequence.

use std::cmp::Ordering;

use rayon::prelude::*;
use rug::Integer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PrimalityError, Result};
use crate::modexp::square_and_multiply;
use crate::witness::WitnessSource;

/// Outcome of a probabilistic test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every trial passed. Never a proof: pseudoprimes land here too.
    ProbablyPrime,
    /// A witness disproved primality. Always correct.
    Composite,
}

impl Verdict {
    pub fn is_probably_prime(self) -> bool {
        self == Verdict::ProbablyPrime
    }
}

/// Which per-trial predicate the driver applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Fermat,
    Lehmann,
    MillerRabin,
}

impl TestKind {
    /// Trial count used when the caller does not choose one.
    pub fn default_rounds(self) -> u32 {
        match self {
            TestKind::Fermat | TestKind::Lehmann => 5,
            TestKind::MillerRabin => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TestKind::Fermat => "fermat",
            TestKind::Lehmann => "lehmann",
            TestKind::MillerRabin => "miller-rabin",
        }
    }
}

/// Per-candidate precomputation for one predicate.
enum Predicate {
    Fermat,
    Lehmann { half: Integer },
    MillerRabin { d: Integer, r: u32 },
}

/// A candidate prepared for repeated trials of one kind.
struct Trial<'a> {
    n: &'a Integer,
    n_minus_1: Integer,
    predicate: Predicate,
}

impl<'a> Trial<'a> {
    /// `n` must be odd and at least 5.
    fn new(kind: TestKind, n: &'a Integer) -> Self {
        let n_minus_1 = Integer::from(n - 1u32);
        let predicate = match kind {
            TestKind::Fermat => Predicate::Fermat,
            TestKind::Lehmann => Predicate::Lehmann {
                half: Integer::from(&n_minus_1 >> 1u32),
            },
            TestKind::MillerRabin => {
                // n-1 is even and non-zero, so a lowest set bit exists
                let r = n_minus_1.find_one(0).unwrap_or(0);
                let d = Integer::from(&n_minus_1 >> r);
                Predicate::MillerRabin { d, r }
            }
        };
        Trial {
            n,
            n_minus_1,
            predicate,
        }
    }

    /// True when `a` is a witness of compositeness.
    fn proves_composite(&self, a: &Integer) -> bool {
        let n = self.n;
        match &self.predicate {
            Predicate::Fermat => square_and_multiply(a, &self.n_minus_1, n) != 1u32,
            Predicate::Lehmann { half } => {
                let r = square_and_multiply(a, half, n);
                r != 1u32 && r != self.n_minus_1
            }
            Predicate::MillerRabin { d, r } => {
                let mut x = square_and_multiply(a, d, n);
                if x == 1u32 || x == self.n_minus_1 {
                    return false;
                }
                for _ in 1..*r {
                    x.square_mut();
                    x %= n;
                    if x == self.n_minus_1 {
                        return false;
                    }
                }
                true
            }
        }
    }
}

fn validate(n: &Integer, rounds: u32) -> Result<()> {
    if n.cmp0() != Ordering::Greater {
        return Err(PrimalityError::invalid(format!(
            "candidate must be positive, got {}",
            n
        )));
    }
    if rounds < 1 {
        return Err(PrimalityError::invalid("rounds must be at least 1"));
    }
    Ok(())
}

/// Verdicts that need no trials: 1, 2, 3 and even numbers.
fn preamble(n: &Integer) -> Option<Verdict> {
    if *n == 1u32 {
        Some(Verdict::Composite)
    } else if *n == 2u32 || *n == 3u32 {
        Some(Verdict::ProbablyPrime)
    } else if n.is_even() {
        Some(Verdict::Composite)
    } else {
        None
    }
}

fn witness_range(n: &Integer) -> (Integer, Integer) {
    (Integer::from(2u32), Integer::from(n - 2u32))
}

/// Run `rounds` trials of `kind` against `n`, stopping at the first witness
/// of compositeness.
pub fn run_test<W>(kind: TestKind, n: &Integer, rounds: u32, source: &mut W) -> Result<Verdict>
where
    W: WitnessSource + ?Sized,
{
    validate(n, rounds)?;
    if let Some(verdict) = preamble(n) {
        return Ok(verdict);
    }

    let trial = Trial::new(kind, n);
    let (low, high) = witness_range(n);
    for round in 0..rounds {
        let a = source.sample(&low, &high);
        if trial.proves_composite(&a) {
            debug!(test = kind.name(), round, witness = %a, "composite witness found");
            return Ok(Verdict::Composite);
        }
    }
    Ok(Verdict::ProbablyPrime)
}

/// Same verdict as [`run_test`], with the trials spread over the rayon pool.
pub fn run_test_parallel<W>(
    kind: TestKind,
    n: &Integer,
    rounds: u32,
    source: &mut W,
) -> Result<Verdict>
where
    W: WitnessSource + ?Sized,
{
    validate(n, rounds)?;
    if let Some(verdict) = preamble(n) {
        return Ok(verdict);
    }

    let trial = Trial::new(kind, n);
    let (low, high) = witness_range(n);
    let witnesses: Vec<Integer> = (0..rounds).map(|_| source.sample(&low, &high)).collect();

    let composite = witnesses.par_iter().any(|a| trial.proves_composite(a));
    Ok(if composite {
        Verdict::Composite
    } else {
        Verdict::ProbablyPrime
    })
}

/// Fermat test with the default 5 rounds.
pub fn fermat<W: WitnessSource + ?Sized>(n: &Integer, source: &mut W) -> Result<Verdict> {
    run_test(TestKind::Fermat, n, TestKind::Fermat.default_rounds(), source)
}

/// Lehmann test with the default 5 rounds.
pub fn lehmann<W: WitnessSource + ?Sized>(n: &Integer, source: &mut W) -> Result<Verdict> {
    run_test(TestKind::Lehmann, n, TestKind::Lehmann.default_rounds(), source)
}

/// Miller–Rabin test with the default 10 rounds.
pub fn miller_rabin<W: WitnessSource + ?Sized>(n: &Integer, source: &mut W) -> Result<Verdict> {
    run_test(
        TestKind::MillerRabin,
        n,
        TestKind::MillerRabin.default_rounds(),
        source,
    )
}
