//! Witness sampling.
//!
//! Trials never reach for a global RNG: the driver is handed a
//! [`WitnessSource`] and asks it for one integer per trial. Production code
//! uses [`RandWitnesses`] (GMP's Mersenne Twister via `rug::rand`); tests
//! pin exact bases with [`FixedWitnesses`].

use std::time::{SystemTime, UNIX_EPOCH};

use rug::rand::RandState;
use rug::Integer;

/// Source of uniformly distributed witnesses.
pub trait WitnessSource {
    /// Return an integer in the inclusive range `[low, high]`. Callers guarantee `low <= high`.
    fn sample(&mut self, low: &Integer, high: &Integer) -> Integer;
}

/// `RandState`-backed witness source.
pub struct RandWitnesses {
    state: RandState<'static>,
}

impl RandWitnesses {
    /// Seeded from the wall clock; successive runs draw different witnesses.
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self::seeded_with(&Integer::from(nanos))
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::seeded_with(&Integer::from(seed))
    }

    fn seeded_with(seed: &Integer) -> Self {
        let mut state = RandState::new();
        state.seed(seed);
        RandWitnesses { state }
    }
}

impl Default for RandWitnesses {
    fn default() -> Self {
        Self::new()
    }
}

impl WitnessSource for RandWitnesses {
    fn sample(&mut self, low: &Integer, high: &Integer) -> Integer {
        let span = Integer::from(high - low) + 1u32;
        span.random_below(&mut self.state) + low
    }
}

/// Replays a fixed list of witnesses, cycling when exhausted.
///
/// Values outside the requested range are clamped to its nearest end, so a
/// list written for one candidate stays usable for smaller ones.
#[derive(Debug, Clone)]
pub struct FixedWitnesses {
    values: Vec<Integer>,
    next: usize,
}

impl FixedWitnesses {
    pub fn new<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        Integer: From<T>,
    {
        FixedWitnesses {
            values: values.into_iter().map(Integer::from).collect(),
            next: 0,
        }
    }
}

impl WitnessSource for FixedWitnesses {
    fn sample(&mut self, low: &Integer, high: &Integer) -> Integer {
        if self.values.is_empty() {
            return low.clone();
        }
        let value = &self.values[self.next % self.values.len()];
        self.next += 1;
        if value < low {
            low.clone()
        } else if value > high {
            high.clone()
        } else {
            value.clone()
        }
    }
}
