//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each
//! `(run, purpose, cycle)` tuple. Sub-seeds are derived via BLAKE3 hashing,
//! so the same master seed reproduces a run exactly, cycle by cycle.

use crate::domain::RunId;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a specific (run, purpose, cycle).
    pub fn sub_seed(&self, run_id: &RunId, purpose: &str, cycle: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(run_id.0.as_bytes());
        hasher.update(purpose.as_bytes());
        hasher.update(&cycle.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Create a seeded StdRng from a sub-seed.
    pub fn rng_for(&self, run_id: &RunId, purpose: &str, cycle: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(run_id, purpose, cycle))
    }
}
