//! # Certificate — Pratt Primality Certificates
//!
//! A Pratt certificate proves `p` prime by exhibiting a base `g` with
//!
//! - `g^(p-1) ≡ 1 (mod p)`, and
//! - `g^((p-1)/q) ≢ 1 (mod p)` for every prime `q` dividing `p − 1`,
//!
//! which forces `g` to have order `p − 1`, and hence `p` to be prime. Each
//! `q` needs its own proof, so the certificate is a tree rooted at `p`,
//! bottoming out at 2 (where `p − 1 = 1` has no prime factors).
//!
//! ## Construction
//!
//! [`build_certificate`] walks the tree with an explicit LIFO work stack and
//! a visited set, both local to the call:
//!
//! 1. Pop `p`; skip it if already visited, otherwise mark it visited.
//! 2. Require `p` to pass [`is_trusted_prime`], else fail with `NotPrime`.
//! 3. Factor `p − 1` into distinct primes, keep the first `max_factors`
//!    (ascending), and record `exponent = (p − 1)/q` for each.
//! 4. Emit the node with the smallest base satisfying the congruences.
//! 5. Push each kept factor not yet visited.
//!
//! The walk stops when the stack empties or `max_primes` nodes exist.
//!
//! ## Bounded representation
//!
//! Both caps exist for fixed-width consumers (the JSON record). Dropping
//! distinct factors beyond `max_factors` is lossy: the congruences are then
//! only checked for the kept factors, which no longer proves primality on
//! its own. [`VerifyReport::complete`] reports whether a certificate is a
//! full proof; raise the caps when it is not.
//!
//! ## References
//!
//! - V.R. Pratt, "Every Prime Has a Succinct Certificate", SIAM J. Comput.
//!   4(3), 1975.
//! - E. Lucas, "Théorie des fonctions numériques simplement périodiques", 1878.

use std::cmp::Ordering;
use std::collections::HashSet;

use rug::Integer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PrimalityError, Result};
use crate::factor::distinct_prime_factors;
use crate::is_trusted_prime;
use crate::modexp::{pow_mod_u64, square_and_multiply};

/// Factor slots per node when the caller does not choose.
pub const DEFAULT_MAX_FACTORS: usize = 5;
/// Node slots per certificate when the caller does not choose.
pub const DEFAULT_MAX_PRIMES: usize = 10;
/// Bases are searched in `[2, min(p, BASE_SEARCH_LIMIT))`.
pub const BASE_SEARCH_LIMIT: u32 = 1 << 16;

/// Size caps of a certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CertificateBounds {
    pub max_factors: usize,
    pub max_primes: usize,
}

impl CertificateBounds {
    pub fn new(max_factors: usize, max_primes: usize) -> Result<Self> {
        if max_factors < 1 {
            return Err(PrimalityError::invalid("max_factors must be at least 1"));
        }
        if max_primes < 1 {
            return Err(PrimalityError::invalid("max_primes must be at least 1"));
        }
        Ok(CertificateBounds {
            max_factors,
            max_primes,
        })
    }
}

impl Default for CertificateBounds {
    fn default() -> Self {
        CertificateBounds {
            max_factors: DEFAULT_MAX_FACTORS,
            max_primes: DEFAULT_MAX_PRIMES,
        }
    }
}

/// One distinct prime `factor` of `p − 1` with `exponent = (p − 1)/factor`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorEntry {
    pub factor: Integer,
    pub exponent: Integer,
}

/// Proof step for a single prime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateNode {
    pub prime: Integer,
    /// Witness of order `p − 1`; 1 for `p = 2`.
    pub base: Integer,
    /// Non-padding entries, ascending by factor.
    pub entries: Vec<FactorEntry>,
}

impl CertificateNode {
    /// True when the listed factors account for all of `p − 1`.
    pub fn is_fully_factored(&self) -> bool {
        let mut rest = Integer::from(&self.prime - 1u32);
        for entry in &self.entries {
            if entry.factor <= 1u32 {
                return false;
            }
            while rest.is_divisible(&entry.factor) {
                rest.div_exact_mut(&entry.factor);
            }
        }
        rest == 1u32
    }

    /// Whether `base` satisfies the Pratt congruences for the listed factors.
    pub fn congruences_hold(&self) -> bool {
        pratt_congruences_hold(&self.base, &self.prime, &self.entries)
    }
}

/// A Pratt certificate. The root is always the first node and no prime
/// appears twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    nodes: Vec<CertificateNode>,
    bounds: CertificateBounds,
}

impl Certificate {
    pub fn root(&self) -> &Integer {
        &self.nodes[0].prime
    }

    pub fn nodes(&self) -> &[CertificateNode] {
        &self.nodes
    }

    pub fn bounds(&self) -> CertificateBounds {
        self.bounds
    }

    pub fn node(&self, prime: &Integer) -> Option<&CertificateNode> {
        self.nodes.iter().find(|n| n.prime == *prime)
    }

    /// Fixed-shape, zero-padded record. `base` is carried as metadata only;
    /// each node's own witness goes into `certWitnesses`.
    pub fn to_record(&self, base: &Integer) -> CertificateRecord {
        let CertificateBounds {
            max_factors,
            max_primes,
        } = self.bounds;
        let zero = || "0".to_string();

        let mut cert_primes = Vec::with_capacity(max_primes);
        let mut cert_factors = Vec::with_capacity(max_primes);
        let mut precomputed_exps = Vec::with_capacity(max_primes);
        let mut cert_witnesses = Vec::with_capacity(max_primes);

        for node in &self.nodes {
            cert_primes.push(node.prime.to_string());
            cert_witnesses.push(node.base.to_string());
            let mut factors: Vec<String> = node.entries.iter().map(|e| e.factor.to_string()).collect();
            let mut exps: Vec<String> = node.entries.iter().map(|e| e.exponent.to_string()).collect();
            factors.resize_with(max_factors, zero);
            exps.resize_with(max_factors, zero);
            cert_factors.push(factors);
            precomputed_exps.push(exps);
        }
        cert_primes.resize_with(max_primes, zero);
        cert_witnesses.resize_with(max_primes, zero);
        cert_factors.resize_with(max_primes, || vec![zero(); max_factors]);
        precomputed_exps.resize_with(max_primes, || vec![zero(); max_factors]);

        CertificateRecord {
            main_prime: self.root().to_string(),
            base: base.to_string(),
            cert_primes,
            cert_factors,
            precomputed_exps,
            cert_witnesses,
        }
    }
}

/// Serialized certificate: three aligned, zero-padded sequences plus the
/// per-node witnesses. Integers are written as decimal strings; on input,
/// JSON numbers are accepted as well.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    #[serde(deserialize_with = "int_text::one")]
    pub main_prime: String,
    #[serde(deserialize_with = "int_text::one")]
    pub base: String,
    #[serde(deserialize_with = "int_text::seq")]
    pub cert_primes: Vec<String>,
    #[serde(deserialize_with = "int_text::grid")]
    pub cert_factors: Vec<Vec<String>>,
    #[serde(deserialize_with = "int_text::grid")]
    pub precomputed_exps: Vec<Vec<String>>,
    /// Absent in records from older producers; bases are then searched again.
    #[serde(default, deserialize_with = "int_text::seq")]
    pub cert_witnesses: Vec<String>,
}

/// Integer fields given either as JSON numbers or as decimal strings.
mod int_text {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text<E: Error>(value: Value) -> Result<String, E> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(E::custom(format!("expected an integer, got {}", other))),
        }
    }

    pub fn one<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        text(Value::deserialize(d)?)
    }

    pub fn seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Vec::<Value>::deserialize(d)?
            .into_iter()
            .map(text::<D::Error>)
            .collect()
    }

    pub fn grid<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<String>>, D::Error> {
        Vec::<Vec<Value>>::deserialize(d)?
            .into_iter()
            .map(|row| row.into_iter().map(text::<D::Error>).collect::<Result<Vec<_>, _>>())
            .collect()
    }
}

fn parse_int(field: &str, value: &str) -> Result<Integer> {
    value
        .trim()
        .parse::<Integer>()
        .map_err(|_| PrimalityError::invalid(format!("{}: not an integer: {:?}", field, value)))
}

impl CertificateRecord {
    /// The record's metadata base.
    pub fn base(&self) -> Result<Integer> {
        parse_int("base", &self.base)
    }

    /// Strip padding and rebuild the certificate.
    pub fn to_certificate(&self) -> Result<Certificate> {
        let max_primes = self.cert_primes.len();
        let max_factors = self.cert_factors.first().map_or(0, Vec::len);
        let bounds = CertificateBounds::new(max_factors, max_primes)?;

        if self.cert_factors.len() != max_primes || self.precomputed_exps.len() != max_primes {
            return Err(PrimalityError::invalid(
                "certPrimes, certFactors and precomputedExps must have the same length",
            ));
        }
        if !self.cert_witnesses.is_empty() && self.cert_witnesses.len() != max_primes {
            return Err(PrimalityError::invalid(
                "certWitnesses must be empty or aligned with certPrimes",
            ));
        }

        let mut nodes = Vec::new();
        let mut padding = false;
        for (i, prime) in self.cert_primes.iter().enumerate() {
            let factors = &self.cert_factors[i];
            let exps = &self.precomputed_exps[i];
            if factors.len() != max_factors || exps.len() != max_factors {
                return Err(PrimalityError::invalid(format!(
                    "row {} must hold exactly {} factors and exponents",
                    i, max_factors
                )));
            }

            let prime = parse_int("certPrimes", prime)?;
            if prime == 0u32 {
                padding = true;
                continue;
            }
            if padding {
                return Err(PrimalityError::invalid(format!(
                    "certPrimes has a value after padding at row {}",
                    i
                )));
            }

            let mut entries = Vec::new();
            for (f, e) in factors.iter().zip(exps) {
                let factor = parse_int("certFactors", f)?;
                let exponent = parse_int("precomputedExps", e)?;
                if factor == 0u32 {
                    continue;
                }
                entries.push(FactorEntry { factor, exponent });
            }

            let base = match self.cert_witnesses.get(i) {
                Some(w) => parse_int("certWitnesses", w)?,
                None => search_base(&prime, &entries)?,
            };
            nodes.push(CertificateNode {
                prime,
                base,
                entries,
            });
        }

        let root = nodes
            .first()
            .ok_or_else(|| PrimalityError::invalid("certificate has no primes"))?;
        let main_prime = parse_int("mainPrime", &self.main_prime)?;
        if root.prime != main_prime {
            return Err(PrimalityError::invalid(format!(
                "mainPrime {} is not the first certificate prime {}",
                main_prime, root.prime
            )));
        }
        Ok(Certificate { nodes, bounds })
    }
}

/// Base for a record row that carries no witness. The search only runs for
/// a prime whose exponents match its factors.
fn search_base(prime: &Integer, entries: &[FactorEntry]) -> Result<Integer> {
    if !is_trusted_prime(prime) {
        return Err(node_error(prime, "not prime"));
    }
    let p_minus_1 = Integer::from(prime - 1u32);
    for e in entries {
        if e.factor < 2u32 || Integer::from(&e.factor * &e.exponent) != p_minus_1 {
            return Err(node_error(
                prime,
                format!("exponent for {} is not (p-1)/{}", e.factor, e.factor),
            ));
        }
    }
    find_base(prime, entries).ok_or_else(|| no_base(prime))
}

fn no_base(prime: &Integer) -> PrimalityError {
    node_error(
        prime,
        format!("no base below {} satisfies the Pratt congruences", BASE_SEARCH_LIMIT),
    )
}

fn pratt_congruences_hold(g: &Integer, p: &Integer, entries: &[FactorEntry]) -> bool {
    if *p < 2u32 {
        return false;
    }
    if let (Some(p64), Some(g64)) = (p.to_u64(), g.to_u64()) {
        let is_one = |e: u64| pow_mod_u64(g64, e, p64) == 1;
        return is_one(p64 - 1)
            && entries.iter().all(|e| match e.exponent.to_u64() {
                Some(x) => !is_one(x),
                None => square_and_multiply(g, &e.exponent, p) != 1u32,
            });
    }
    let p_minus_1 = Integer::from(p - 1u32);
    square_and_multiply(g, &p_minus_1, p) == 1u32
        && entries
            .iter()
            .all(|e| square_and_multiply(g, &e.exponent, p) != 1u32)
}

/// Smallest base `g ∈ [2, min(p, BASE_SEARCH_LIMIT))` meeting the Pratt
/// congruences for `entries` (1 for `p = 2`). `None` when no base in range
/// works, which for small `p` means it is not prime.
pub fn find_base(p: &Integer, entries: &[FactorEntry]) -> Option<Integer> {
    if *p == 2u32 {
        return Some(Integer::from(1u32));
    }
    let mut g = Integer::from(2u32);
    while g < *p && g < BASE_SEARCH_LIMIT {
        if pratt_congruences_hold(&g, p, entries) {
            return Some(g);
        }
        g += 1u32;
    }
    None
}

fn expand_node(p: Integer, max_factors: usize) -> Result<CertificateNode> {
    let p_minus_1 = Integer::from(&p - 1u32);
    let mut factors = distinct_prime_factors(&p_minus_1);
    if factors.len() > max_factors {
        warn!(
            prime = %p,
            distinct = factors.len(),
            kept = max_factors,
            "dropping distinct factors of p-1 beyond max_factors; certificate will be incomplete"
        );
        factors.truncate(max_factors);
    }

    let entries: Vec<FactorEntry> = factors
        .into_iter()
        .map(|q| FactorEntry {
            exponent: Integer::from(p_minus_1.div_exact_ref(&q)),
            factor: q,
        })
        .collect();

    let base = find_base(&p, &entries).ok_or_else(|| no_base(&p))?;
    debug!(prime = %p, base = %base, factors = entries.len(), "certificate node");
    Ok(CertificateNode {
        prime: p,
        base,
        entries,
    })
}

/// Build a Pratt certificate for `prime` within `bounds`.
///
/// Fails with `InvalidInput` for `prime <= 0` and with `NotPrime` when any
/// value taken off the work stack (the root included) is not prime.
pub fn build_certificate(prime: &Integer, bounds: CertificateBounds) -> Result<Certificate> {
    if prime.cmp0() != Ordering::Greater {
        return Err(PrimalityError::invalid(format!(
            "certificate root must be positive, got {}",
            prime
        )));
    }

    let mut nodes: Vec<CertificateNode> = Vec::with_capacity(bounds.max_primes);
    let mut visited: HashSet<Integer> = HashSet::new();
    let mut stack = vec![prime.clone()];

    while nodes.len() < bounds.max_primes {
        let Some(p) = stack.pop() else {
            break;
        };
        if !visited.insert(p.clone()) {
            continue;
        }
        if !is_trusted_prime(&p) {
            return Err(PrimalityError::NotPrime(p));
        }

        let node = expand_node(p, bounds.max_factors)?;
        for entry in &node.entries {
            if entry.factor > 1u32 && !visited.contains(&entry.factor) {
                stack.push(entry.factor.clone());
            }
        }
        nodes.push(node);
    }

    info!(
        root = %prime,
        nodes = nodes.len(),
        unexpanded = stack.len(),
        "pratt certificate built"
    );
    Ok(Certificate { nodes, bounds })
}

/// Summary of a successful verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub nodes_checked: usize,
    /// Every node is fully factored and every factor above 2 has its own node:
    /// the certificate alone proves the root prime.
    pub complete: bool,
}

fn node_error(prime: &Integer, reason: impl Into<String>) -> PrimalityError {
    PrimalityError::CertificateInvalid {
        prime: prime.clone(),
        reason: reason.into(),
    }
}

/// Re-check every node of `cert`.
///
/// Each listed factor must be a prime dividing `p − 1` with the recorded
/// exponent, and the node's base must satisfy the Pratt congruences. Factors
/// without a node of their own (dropped by `max_primes`) and primes of
/// partially factored nodes are checked with [`is_trusted_prime`] and make
/// the report incomplete.
pub fn verify_certificate(cert: &Certificate) -> Result<VerifyReport> {
    let mut seen: HashSet<&Integer> = HashSet::new();
    for node in &cert.nodes {
        if !seen.insert(&node.prime) {
            return Err(node_error(&node.prime, "prime appears twice"));
        }
    }

    let mut complete = true;
    for node in &cert.nodes {
        let p = &node.prime;
        if *p < 2u32 {
            return Err(node_error(p, "certificate primes must be at least 2"));
        }
        if node.entries.len() > cert.bounds.max_factors {
            return Err(node_error(p, "more factors than max_factors"));
        }

        let p_minus_1 = Integer::from(p - 1u32);
        let mut listed: HashSet<&Integer> = HashSet::new();
        for entry in &node.entries {
            let q = &entry.factor;
            if !listed.insert(q) {
                return Err(node_error(p, format!("factor {} listed twice", q)));
            }
            if *q < 2u32 || !p_minus_1.is_divisible(q) {
                return Err(node_error(p, format!("{} does not divide p-1", q)));
            }
            if Integer::from(q * &entry.exponent) != p_minus_1 {
                return Err(node_error(p, format!("exponent for {} is not (p-1)/{}", q, q)));
            }
            if !seen.contains(q) {
                if *q != 2u32 {
                    complete = false;
                }
                if !is_trusted_prime(q) {
                    return Err(node_error(p, format!("factor {} is not prime", q)));
                }
            }
        }

        // Congruences over a partial factor list prove nothing on their own
        if !node.is_fully_factored() {
            complete = false;
            if !is_trusted_prime(p) {
                return Err(node_error(p, "partially factored and not prime"));
            }
        }
        if !node.congruences_hold() {
            return Err(node_error(
                p,
                format!("base {} fails the Pratt congruences", node.base),
            ));
        }
    }

    Ok(VerifyReport {
        nodes_checked: cert.nodes.len(),
        complete,
    })
}
