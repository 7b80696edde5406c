//! Core trait definitions for the GA.
//!
//! [`FitnessOracle`] is the contract between the engine and whatever scores
//! a glitch, whether a simulation or an arm driving a signal generator and a
//! target board.

use super::chromosome::Chromosome;

/// Scores a chromosome. Higher is better (maximization).
///
/// The oracle must accept any well-formed chromosome (x strictly ascending
/// inside `(0, 1)`, y inside `[-1, 1]`, at least `min_chromosome_length`
/// points). Hardware oracles may average several glitch attempts; the engine
/// only assumes a single call yields a usable scalar.
///
/// # Thread Safety
///
/// `FitnessOracle` must be `Send + Sync` because the engine may score a
/// generation in parallel using rayon.
///
/// # Implementing
///
/// Any `Fn(&Chromosome) -> f64` closure is an oracle:
///
/// ```
/// use glitch_ga::ga::{Chromosome, FitnessOracle};
///
/// let oracle = |c: &Chromosome| -c.freq();
/// # let mut rng = glitch_ga::random::create_rng(1);
/// # let c = Chromosome::random(4, 1e6, 2e6, &mut rng);
/// assert!(oracle.score(&c) < 0.0);
/// ```
pub trait FitnessOracle: Send + Sync {
    /// Returns the fitness of `chromosome`.
    fn score(&self, chromosome: &Chromosome) -> f64;
}

impl<F> FitnessOracle for F
where
    F: Fn(&Chromosome) -> f64 + Send + Sync,
{
    fn score(&self, chromosome: &Chromosome) -> f64 {
        self(chromosome)
    }
}
