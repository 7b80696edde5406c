//! Seedable random number generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Creates a deterministic RNG from a seed.
///
/// Two engines built with the same seed and the same oracle produce the
/// same run when scoring sequentially.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draws a version-4 UUID from `rng` instead of the OS entropy source,
/// so identity tokens are reproducible under a fixed seed.
pub fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}
