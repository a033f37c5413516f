use rand::Rng;

/// Source of the random numbers used for placeholder values.
pub trait RandomSource: Send + Sync {
    /// A value uniformly drawn from `low..=high`.
    fn uniform_inclusive(&self, low: u8, high: u8) -> u8;
}

/// Thread-local RNG from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform_inclusive(&self, low: u8, high: u8) -> u8 {
        rand::thread_rng().gen_range(low..=high)
    }
}
