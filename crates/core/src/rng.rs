use crate::PlayerId;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Source of player ids. Seeded for reproducible tests, entropy-backed otherwise.
#[derive(Debug, Clone)]
pub struct IdSource {
    rng: StdRng,
}

impl IdSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next_id(&mut self) -> PlayerId {
        PlayerId::new(format!("p{:016x}", self.rng.next_u64()))
    }
}
