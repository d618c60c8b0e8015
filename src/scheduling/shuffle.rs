//! Fairness shuffling
//!
//! Selectors over-fetch candidates in a stable order and then shuffle before
//! truncating, so a large pool is not always presented in the same order.
//! The randomness source is always handed in by the caller.

use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Reorders a candidate pool in place
pub trait Shuffler {
    fn shuffle<T>(&mut self, items: &mut [T]);

    /// Shuffle an owned sequence and hand it back
    fn shuffled<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        self.shuffle(&mut items);
        items
    }
}

/// Uniform Fisher-Yates permutation driven by `R`
#[derive(Debug, Clone)]
pub struct RandomShuffler<R> {
    rng: R,
}

impl RandomShuffler<ThreadRng> {
    /// Shuffler backed by the lazily seeded per-thread generator
    pub fn from_thread_rng() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl RandomShuffler<StdRng> {
    /// Reproducible shuffler
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomShuffler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Shuffler for RandomShuffler<R> {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Leaves the order untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityShuffler;

impl Shuffler for IdentityShuffler {
    fn shuffle<T>(&mut self, _items: &mut [T]) {}
}

impl<S: Shuffler> Shuffler for &mut S {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        (**self).shuffle(items);
    }
}
