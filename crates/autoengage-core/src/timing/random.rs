use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Source of uniform randomness.
pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Uniform sample in `[min, max)`.
    fn between(&self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// True with probability `p`.
    fn chance(&self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Random duration in `[min_ms, max_ms)`, bounds swapped if inverted.
    fn millis_between(&self, min_ms: u64, max_ms: u64) -> Duration {
        let (lo, hi) = if max_ms < min_ms {
            (max_ms, min_ms)
        } else {
            (min_ms, max_ms)
        };
        Duration::from_millis(self.between(lo as f64, hi as f64).floor() as u64)
    }

    /// Random index into a collection of `len` items.
    fn index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(((self.next_f64() * len as f64).floor() as usize).min(len - 1))
    }
}

/// Default randomness: a seeded-from-entropy [`StdRng`].
pub struct ThreadRandom {
    rng: Mutex<StdRng>,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().r#gen::<f64>()
    }
}
