//! Uniform random source owned by each aggregate.
//!
//! Every stochastic decision in the engine (walk direction, spawn placement,
//! stick test) derives from a single stream of uniform draws in [0, 1), so a
//! seeded source makes a whole run bit-reproducible.
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Scale mapping 53 random bits onto [0, 1).
const F64_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// A resettable stream of uniform draws in [0, 1).
///
/// The seed is recorded even when drawn from OS entropy, so the stream can
/// always be rewound with [`UniformSource::reset`] and replayed.
#[derive(Clone, Debug)]
pub struct UniformSource {
    rng: StdRng,
    seed: u64,
}

impl UniformSource {
    /// Source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// Source seeded with a fixed value, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next uniform draw in [0, 1). Consumes exactly one engine step.
    #[inline]
    pub fn next_probability(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 * F64_SCALE
    }

    /// Rewinds the stream to its recorded seed so the draw sequence replays.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Replaces the seed and rewinds.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.reset();
    }
}

impl Default for UniformSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_unit_interval() {
        let mut source = UniformSource::seeded(7);
        for _ in 0..10_000 {
            let u = source.next_probability();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let mut a = UniformSource::seeded(123);
        let mut b = UniformSource::seeded(123);
        for _ in 0..256 {
            assert_eq!(a.next_probability(), b.next_probability());
        }
    }

    #[test]
    fn reset_rewinds_the_stream() {
        let mut source = UniformSource::seeded(42);
        let first: Vec<f64> = (0..16).map(|_| source.next_probability()).collect();
        source.reset();
        let replay: Vec<f64> = (0..16).map(|_| source.next_probability()).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn clone_copies_the_engine_state() {
        let mut source = UniformSource::seeded(9);
        source.next_probability();
        let mut fork = source.clone();
        assert_eq!(source.next_probability(), fork.next_probability());
    }

    #[test]
    fn entropy_seeds_are_recorded() {
        let source = UniformSource::from_entropy();
        let mut replay = UniformSource::seeded(source.seed());
        let mut original = source.clone();
        assert_eq!(original.next_probability(), replay.next_probability());
    }
}
