//! # Factor — Distinct Prime Factors of p − 1
//!
//! The certificate builder needs the set of distinct primes dividing `p − 1`
//! for every node. Factoring proceeds in three stages:
//!
//! 1. Trial division by every prime up to [`TRIAL_DIVISION_LIMIT`].
//! 2. Pollard's P−1 stage 1 with bound B1 on any composite cofactor. Cheap,
//!    and effective whenever a hidden factor `q` has smooth `q − 1`.
//! 3. Pollard–Brent rho as the general fallback.
//!
//! Cofactors are classified with [`is_trusted_prime`] and split until every
//! piece is prime. Factoring is exact, so the result is deterministic for a
//! given input even though rho's running time depends on its polynomial.
//!
//! ## References
//!
//! - J.M. Pollard, "Theorems on factorization and primality testing", 1974.
//! - R.P. Brent, "An improved Monte Carlo factorization algorithm", BIT 20, 1980.

use std::sync::OnceLock;

use rug::Integer;

use crate::is_trusted_prime;
use crate::modexp::square_and_multiply;
use crate::sieve::generate_primes;

/// Trial division bound; also used as the P−1 stage 1 bound.
pub const TRIAL_DIVISION_LIMIT: u64 = 10_000;

/// Products accumulated between gcds in Brent's loop.
const BRENT_BATCH: u64 = 128;

fn small_primes() -> &'static [u64] {
    static TABLE: OnceLock<Vec<u64>> = OnceLock::new();
    TABLE.get_or_init(|| generate_primes(TRIAL_DIVISION_LIMIT))
}

/// Distinct prime factors of `n`, ascending. Empty for `n <= 1`.
pub fn distinct_prime_factors(n: &Integer) -> Vec<Integer> {
    let mut factors = Vec::new();
    if *n <= 1u32 {
        return factors;
    }

    let mut rest = n.clone();
    for &p in small_primes() {
        if Integer::from(p * p) > rest {
            break;
        }
        let p32 = p as u32;
        if rest.is_divisible_u(p32) {
            factors.push(Integer::from(p));
            while rest.is_divisible_u(p32) {
                rest.div_exact_u_mut(p32);
            }
        }
    }

    if rest > 1u32 {
        split_cofactor(rest, &mut factors);
    }
    factors.sort();
    factors.dedup();
    factors
}

/// Split `n` into primes, appending each prime piece to `out`.
fn split_cofactor(n: Integer, out: &mut Vec<Integer>) {
    let mut pending = vec![n];
    while let Some(m) = pending.pop() {
        if m == 1u32 {
            continue;
        }
        if is_trusted_prime(&m) {
            out.push(m);
            continue;
        }
        if m.is_perfect_square() {
            let root = m.sqrt();
            pending.push(root.clone());
            pending.push(root);
            continue;
        }
        let d = p1_stage1(&m, TRIAL_DIVISION_LIMIT).unwrap_or_else(|| pollard_brent(&m));
        let cofactor = Integer::from(m.div_exact_ref(&d));
        pending.push(d);
        pending.push(cofactor);
    }
}

/// Pollard's P−1 stage 1.
///
/// Computes a = 2^(lcm(1..B1)) mod n, then checks gcd(a-1, n).
/// Returns `Some(factor)` if a non-trivial factor is found, `None` otherwise.
pub fn p1_stage1(n: &Integer, b1: u64) -> Option<Integer> {
    if b1 < 2 || *n <= 3u32 {
        return None;
    }

    let mut a = Integer::from(2u32);
    for &q in small_primes().iter().take_while(|&&q| q <= b1) {
        // Largest power of q not exceeding b1
        let mut pk = q;
        while pk <= b1 / q {
            pk *= q;
        }
        a = square_and_multiply(&a, &Integer::from(pk), n);
    }

    let g = Integer::from(&a - 1u32).gcd(n);
    if g > 1u32 && &g < n {
        Some(g)
    } else {
        None
    }
}

/// Pollard–Brent rho. `n` must be composite and not a perfect square.
///
/// Walks `x ↦ x² + c (mod n)` for c = 1, 2, ... until a non-trivial gcd
/// appears. Always returns a proper divisor of `n`.
pub fn pollard_brent(n: &Integer) -> Integer {
    if n.is_even() {
        return Integer::from(2u32);
    }
    let mut c = 1u32;
    loop {
        if let Some(d) = brent_cycle(n, c) {
            return d;
        }
        c += 1;
    }
}

fn brent_cycle(n: &Integer, c: u32) -> Option<Integer> {
    let step = |x: &Integer| -> Integer {
        let mut y = Integer::from(x.square_ref()) + c;
        y %= n;
        y
    };

    let mut y = Integer::from(2u32);
    let mut x = y.clone();
    let mut ys = y.clone();
    let mut q = Integer::from(1u32);
    let mut g = Integer::from(1u32);
    let mut r: u64 = 1;

    while g == 1u32 {
        x.clone_from(&y);
        for _ in 0..r {
            y = step(&y);
        }
        let mut k = 0;
        while k < r && g == 1u32 {
            ys.clone_from(&y);
            for _ in 0..BRENT_BATCH.min(r - k) {
                y = step(&y);
                q *= Integer::from(&x - &y).abs();
                q %= n;
            }
            g = q.clone().gcd(n);
            k += BRENT_BATCH;
        }
        r *= 2;
    }

    if g == *n {
        // The batch overshot; replay it one step at a time
        loop {
            ys = step(&ys);
            g = Integer::from(&x - &ys).abs().gcd(n);
            if g > 1u32 {
                break;
            }
        }
    }

    if g == *n {
        None
    } else {
        Some(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[u64]) -> Vec<Integer> {
        values.iter().map(|&v| Integer::from(v)).collect()
    }

    #[test]
    fn trivial_inputs_have_no_factors() {
        assert!(distinct_prime_factors(&Integer::from(0)).is_empty());
        assert!(distinct_prime_factors(&Integer::from(1)).is_empty());
    }

    #[test]
    fn small_values_factor_by_trial_division() {
        assert_eq!(distinct_prime_factors(&Integer::from(2)), ints(&[2]));
        assert_eq!(distinct_prime_factors(&Integer::from(12)), ints(&[2, 3]));
        assert_eq!(distinct_prime_factors(&Integer::from(360)), ints(&[2, 3, 5]));
        assert_eq!(distinct_prime_factors(&Integer::from(97)), ints(&[97]));
        assert_eq!(distinct_prime_factors(&Integer::from(120120)), ints(&[2, 3, 5, 7, 11, 13]));
    }

    #[test]
    fn reference_values_for_8675309() {
        assert_eq!(distinct_prime_factors(&Integer::from(8675308)), ints(&[2, 2168827]));
        assert_eq!(
            distinct_prime_factors(&Integer::from(2168826)),
            ints(&[2, 3, 11, 17, 1933])
        );
    }

    #[test]
    fn large_cofactors_are_split() {
        // Two primes above the trial division limit
        let n = Integer::from(1_000_003u64) * Integer::from(999_983u64);
        assert_eq!(distinct_prime_factors(&n), ints(&[999_983, 1_000_003]));

        // Square of a large prime plus small factors
        let n = Integer::from(1_000_003u64) * Integer::from(1_000_003u64) * 12u32;
        assert_eq!(distinct_prime_factors(&n), ints(&[2, 3, 1_000_003]));

        // M127 - 1 = 2 * 3^3 * 7^2 * 19 * 43 * 73 * 127 * 337 * 5419 * 92737 * 649657 * 77158673929
        let m127 = (Integer::from(1u32) << 127u32) - 1u32;
        let factors = distinct_prime_factors(&Integer::from(&m127 - 1u32));
        assert_eq!(
            factors,
            ints(&[2, 3, 7, 19, 43, 73, 127, 337, 5419, 92737, 649657, 77158673929])
        );
    }

    #[test]
    fn factors_divide_and_are_prime() {
        for v in [510510u64, 8675308, 982451652, 600851475143] {
            let n = Integer::from(v);
            for f in distinct_prime_factors(&n) {
                assert!(n.is_divisible(&f), "{} does not divide {}", f, v);
                assert!(is_trusted_prime(&f), "{} is not prime", f);
            }
        }
    }

    #[test]
    fn pollard_brent_finds_proper_divisor() {
        let n = Integer::from(10403u32); // 101 * 103
        let d = pollard_brent(&n);
        assert!(d == 101u32 || d == 103u32);
    }

    #[test]
    fn p1_finds_smooth_factor() {
        // 65537 - 1 = 2^16 is smooth, 1000003 - 1 = 2 * 3 * 166667 is not
        let n = Integer::from(65537u64) * Integer::from(1_000_003u64);
        assert_eq!(p1_stage1(&n, 10_000), Some(Integer::from(65537u32)));
        assert_eq!(p1_stage1(&Integer::from(3u32), 10_000), None);
    }
}
