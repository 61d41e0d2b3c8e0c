//! Injected randomness.
//!
//! The agent never touches a global generator. A `NoiseSource` is handed in at
//! construction, carries its own seed and stream position, and can be
//! snapshotted and restored exactly. Deterministic mode switches chemical
//! noise off but keeps the seeded stream for every other draw, so two agents
//! built from the same seed produce identical trajectories.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: ChaCha8Rng,
    seed: u64,
    chemical_noise: bool,
}

/// Serializable position of a [`NoiseSource`] stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseSnapshot {
    pub seed: u64,
    pub word_pos: u64,
    pub chemical_noise: bool,
}

impl NoiseSource {
    /// Noisy source with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            chemical_noise: true,
        }
    }

    /// Noise-free source. Non-chemical draws still come from the seeded stream.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            chemical_noise: false,
            ..Self::seeded(seed)
        }
    }

    /// Noisy source seeded from the OS.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::thread_rng().next_u64())
    }

    pub fn is_deterministic(&self) -> bool {
        !self.chemical_noise
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform perturbation in `[-amplitude, amplitude]`.
    ///
    /// Returns 0 without consuming the stream when chemical noise is off or
    /// the amplitude is not a positive finite number.
    pub fn uniform(&mut self, amplitude: f64) -> f64 {
        if !self.chemical_noise || !(amplitude > 0.0) || !amplitude.is_finite() {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }

    /// Uniform draw in `[0, 1)`, available in every mode.
    pub fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn snapshot(&self) -> NoiseSnapshot {
        NoiseSnapshot {
            seed: self.seed,
            word_pos: u64::try_from(self.rng.get_word_pos()).unwrap_or(u64::MAX),
            chemical_noise: self.chemical_noise,
        }
    }

    pub fn restore(snapshot: NoiseSnapshot) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(snapshot.seed);
        rng.set_word_pos(u128::from(snapshot.word_pos));
        Self {
            rng,
            seed: snapshot.seed,
            chemical_noise: snapshot.chemical_noise,
        }
    }
}
