pub mod certificate;
pub mod error;
pub mod factor;
pub mod modexp;
pub mod output;
pub mod probable;
pub mod sieve;
pub mod witness;

pub use certificate::{
    build_certificate, verify_certificate, Certificate, CertificateBounds, CertificateNode,
    CertificateRecord, FactorEntry, VerifyReport,
};
pub use error::PrimalityError;
pub use modexp::pow_mod;
pub use probable::{run_test, run_test_parallel, TestKind, Verdict};
pub use witness::{FixedWitnesses, RandWitnesses, WitnessSource};

use rug::integer::IsPrime;
use rug::Integer;

/// Full GMP rounds behind [`is_trusted_prime`]. Error bound ≤ 4^-30 on top of BPSW.
pub const TRUSTED_ROUNDS: u32 = 30;

/// Small primes for trial division pre-filter.
const SMALL_PRIMES: [u32; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

/// Quick check if n is divisible by any small prime.
/// Returns true if n is definitely composite (has a small factor).
/// Returns false if n might be prime (passed trial division).
pub fn has_small_factor(n: &Integer) -> bool {
    for &p in &SMALL_PRIMES {
        if n.is_divisible_u(p) {
            // If n equals the small prime itself, it's prime, not composite
            return n > &Integer::from(p);
        }
    }
    false
}

/// Two-round Miller-Rabin pre-screening: run 2 fast rounds first, full rounds only for survivors.
pub fn mr_screened_test(candidate: &Integer, mr_rounds: u32) -> IsPrime {
    if mr_rounds > 2 && candidate.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    candidate.is_probably_prime(mr_rounds)
}

/// The primality check the certificate builder and verifier trust.
///
/// Trial division by the small-prime table, then GMP's BPSW plus
/// [`TRUSTED_ROUNDS`] Miller–Rabin rounds. No BPSW counterexample is known.
pub fn is_trusted_prime(n: &Integer) -> bool {
    if *n < 2u32 || has_small_factor(n) {
        return false;
    }
    mr_screened_test(n, TRUSTED_ROUNDS) != IsPrime::No
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::ops::Pow;

    #[test]
    fn has_small_factor_returns_false_for_small_primes() {
        // Each small prime in our table should NOT be flagged as composite
        for &p in &SMALL_PRIMES {
            let n = Integer::from(p);
            assert!(
                !has_small_factor(&n),
                "has_small_factor incorrectly flagged prime {} as composite",
                p
            );
        }
    }

    #[test]
    fn has_small_factor_returns_true_for_composites() {
        let composites: &[u32] = &[4, 6, 8, 9, 10, 12, 15, 21, 25, 35, 49, 100, 1000, 561];
        for &c in composites {
            let n = Integer::from(c);
            assert!(has_small_factor(&n), "has_small_factor missed composite {}", c);
        }
    }

    #[test]
    fn has_small_factor_composite_product_of_large_primes() {
        // 313 * 317 = 99221 — both factors are outside our small primes table
        let n = Integer::from(313u32 * 317);
        assert!(!has_small_factor(&n));
        assert!(!is_trusted_prime(&n));
    }

    #[test]
    fn trusted_prime_agrees_with_sieve_below_10000() {
        let primes = sieve::generate_primes(10_000);
        let mut next = primes.iter().peekable();
        for v in 0u64..10_000 {
            let is_listed = next.peek().is_some_and(|&&p| p == v);
            if is_listed {
                next.next();
            }
            assert_eq!(
                is_trusted_prime(&Integer::from(v)),
                is_listed,
                "is_trusted_prime disagrees with the sieve on {}",
                v
            );
        }
    }

    #[test]
    fn trusted_prime_rejects_strong_pseudoprimes_and_accepts_large_primes() {
        // Strong pseudoprimes to base 2 (2047, 3277, 4033) and a Carmichael number
        for c in [2047u32, 3277, 4033, 4681, 8911] {
            assert!(!is_trusted_prime(&Integer::from(c)), "{} accepted", c);
        }
        let m127 = Integer::from(2u32).pow(127) - 1u32;
        assert!(is_trusted_prime(&m127));
        assert!(!is_trusted_prime(&(m127 + 2u32)));
    }

    #[test]
    fn mr_screened_test_known_composites_fail() {
        let composites: &[u32] = &[4, 6, 8, 9, 15, 21, 25, 100, 1001, 10000];
        for &c in composites {
            let n = Integer::from(c);
            assert_eq!(mr_screened_test(&n, 25), IsPrime::No, "MR accepted composite {}", c);
        }
    }
}
