//! # ModExp — Modular Exponentiation
//!
//! `base^exponent mod modulus` by binary (square-and-multiply) exponentiation.
//! The accumulator is squared once per exponent bit and multiplied into the
//! result register whenever that bit is set; both are reduced after every
//! multiplication, so no operand ever grows past `modulus²`.
//!
//! Cost is O(log exponent) modular multiplications. Every probabilistic trial
//! and every certificate check funnels through here.

use std::cmp::Ordering;

use rug::ops::RemRounding;
use rug::Integer;

use crate::error::{PrimalityError, Result};

/// Compute `base^exponent mod modulus`.
///
/// Requires `modulus >= 1` and `exponent >= 0`; otherwise `InvalidInput`.
/// A modulus of 1 always yields 0. Negative bases are reduced into
/// `[0, modulus)` before exponentiation.
pub fn pow_mod(base: &Integer, exponent: &Integer, modulus: &Integer) -> Result<Integer> {
    if *modulus < 1 {
        return Err(PrimalityError::invalid(format!(
            "modulus must be at least 1, got {}",
            modulus
        )));
    }
    if exponent.cmp0() == Ordering::Less {
        return Err(PrimalityError::invalid(format!(
            "exponent must be non-negative, got {}",
            exponent
        )));
    }
    Ok(square_and_multiply(base, exponent, modulus))
}

/// Unchecked core of [`pow_mod`]. Callers guarantee `modulus >= 1`, `exponent >= 0`.
pub(crate) fn square_and_multiply(base: &Integer, exponent: &Integer, modulus: &Integer) -> Integer {
    if *modulus == 1 {
        return Integer::new();
    }
    let mut acc = base.clone().rem_euc(modulus);
    let mut result = Integer::from(1);

    let bits = exponent.significant_bits();
    for i in 0..bits {
        if exponent.get_bit(i) {
            result *= &acc;
            result %= modulus;
        }
        // The final squaring would be discarded
        if i + 1 < bits {
            acc.square_mut();
            acc %= modulus;
        }
    }
    result
}

/// Word-sized modular exponentiation with u128 intermediates.
pub fn pow_mod_u64(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result as u128 * base as u128 % modulus as u128) as u64;
        }
        exp >>= 1;
        base = (base as u128 * base as u128 % modulus as u128) as u64;
    }
    result
}
