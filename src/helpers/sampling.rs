//! # Sampling helpers
//!
//! `shuffle` and `random` draw from a tiny `SplitMix64` PRNG. Passing a seed
//! makes the result reproducible; without one the generator is seeded from
//! the system clock.

use crate::error::{CollectionError, Result};
use crate::values::{Items, list_items};
use chrono::Utc;

/// `SplitMix64` generator.
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from `seed`, or from the current time when `None`.
    #[must_use]
    pub fn seeded(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(clock_seed))
    }

    #[inline]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..bound` (`bound > 0`).
    #[allow(clippy::cast_possible_truncation)]
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

#[allow(clippy::cast_sign_loss)]
fn clock_seed() -> u64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64
}

/// Fisher-Yates shuffle of the values, re-indexed.
#[must_use]
pub fn shuffle(items: &Items, seed: Option<u64>) -> Items {
    let mut values: Vec<_> = items.values().cloned().collect();
    let mut rng = SplitMix64::seeded(seed);
    for i in (1..values.len()).rev() {
        values.swap(i, rng.below(i + 1));
    }
    list_items(values)
}

/// `count` distinct elements chosen uniformly, in their original order.
///
/// # Errors
/// [`CollectionError::InvalidArgument`] when `count` exceeds the number of
/// elements.
pub fn random(items: &Items, count: usize, preserve_keys: bool, seed: Option<u64>) -> Result<Items> {
    let available = items.len();
    if count > available {
        return Err(CollectionError::InvalidArgument(format!(
            "you requested {count} items, but there are only {available} items available"
        )));
    }

    // Selection sampling keeps the chosen indices in ascending order.
    let mut rng = SplitMix64::seeded(seed);
    let mut needed = count;
    let mut chosen = Vec::with_capacity(count);
    for (i, pair) in items.iter().enumerate() {
        if needed == 0 {
            break;
        }
        if rng.below(available - i) < needed {
            chosen.push(pair);
            needed -= 1;
        }
    }

    Ok(if preserve_keys {
        chosen.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    } else {
        list_items(chosen.into_iter().map(|(_, v)| v.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use serde_json::Value;

    fn numbers(n: i64) -> Items {
        list_items((1..=n).map(Value::from))
    }

    #[test]
    fn shuffle_is_a_reproducible_permutation() {
        let items = numbers(20);
        let a = shuffle(&items, Some(7));
        let b = shuffle(&items, Some(7));
        assert_eq!(a, b);
        let mut sorted: Vec<i64> = a.values().filter_map(Value::as_i64).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn random_picks_exactly_n_in_order() {
        let items = numbers(10);
        let picked = random(&items, 4, true, Some(3)).unwrap();
        assert_eq!(picked.len(), 4);
        let keys: Vec<i64> = picked.keys().filter_map(Key::as_int).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert!(random(&items, 11, false, None).is_err());
        assert_eq!(random(&items, 10, false, None).unwrap().len(), 10);
    }

    #[test]
    fn unseeded_runs_draw_from_the_clock() {
        assert!(clock_seed() > 0);
        let items = numbers(8);
        let mut values: Vec<i64> = shuffle(&items, None).values().filter_map(Value::as_i64).collect();
        values.sort_unstable();
        assert_eq!(values, (1..=8).collect::<Vec<_>>());
    }
}
