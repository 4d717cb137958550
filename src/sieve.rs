//! # Sieve — Small Prime Table
//!
//! Odd-only sieve of Eratosthenes feeding trial division in `factor` and the
//! test fixtures. Index `i` of the bitmap stands for the odd number `2i + 1`,
//! halving memory against the naive sieve. O(n log log n) time.

/// Generate all primes up to and including `limit`, ascending.
pub fn generate_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }

    let limit = limit as usize;
    let half = limit / 2 + 1;
    // composite[i] marks 2i + 1; 1 itself is not prime
    let mut composite = vec![false; half];
    composite[0] = true;

    let mut i = 1;
    while (2 * i + 1) * (2 * i + 1) <= limit {
        if !composite[i] {
            let p = 2 * i + 1;
            let mut m = p * p;
            while m <= limit {
                composite[m / 2] = true;
                m += 2 * p;
            }
        }
        i += 1;
    }

    let mut primes = Vec::with_capacity(estimate_prime_count(limit));
    primes.push(2);
    primes.extend(
        composite
            .iter()
            .enumerate()
            .filter(|&(i, &c)| !c && 2 * i + 1 <= limit)
            .map(|(i, _)| (2 * i + 1) as u64),
    );
    primes
}

/// Estimate prime count up to n using the prime counting function approximation.
fn estimate_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// pi(x) for x = 10, 100, 1000, 10000, 100000 (OEIS A000720).
    #[test]
    fn prime_counts_match_known_values() {
        for (limit, count) in [(10u64, 4usize), (100, 25), (1000, 168), (10_000, 1229), (100_000, 9592)] {
            assert_eq!(generate_primes(limit).len(), count, "pi({})", limit);
        }
    }

    #[test]
    fn tiny_limits() {
        assert!(generate_primes(0).is_empty());
        assert!(generate_primes(1).is_empty());
        assert_eq!(generate_primes(2), vec![2]);
        assert_eq!(generate_primes(3), vec![2, 3]);
        assert_eq!(generate_primes(9), vec![2, 3, 5, 7]);
    }

    #[test]
    fn limit_is_inclusive() {
        assert_eq!(*generate_primes(97).last().unwrap(), 97);
        assert_eq!(*generate_primes(100).last().unwrap(), 97);
    }
}
