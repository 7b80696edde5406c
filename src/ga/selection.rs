//! Selection strategies for the GA.
//!
//! Selection picks the chromosomes that breed the next generation. All
//! strategies here **maximize**: a higher score means a fitter chromosome.
//! Strategies see the scored population as a slice of scores ranked best
//! first, and return a position in that slice.
//!
//! Elitism is not a strategy: the engine copies the top ranks unchanged
//! before any strategy is consulted, so it composes with every strategy.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and
//!   Machine Learning*, ch. 3 (fitness scaling)
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"

use rand::{Rng, RngCore};

/// A pluggable parent-selection strategy.
///
/// Implementations receive the generation's scores in descending order and
/// must return an index into that slice. The RNG is passed as a trait object
/// so strategies can be boxed and injected into the engine.
pub trait SelectionStrategy: Send + Sync {
    /// Selects one position from `ranked_scores`.
    ///
    /// # Panics
    /// May panic if `ranked_scores` is empty.
    fn select(&self, ranked_scores: &[f64], rng: &mut dyn RngCore) -> usize;
}

/// Built-in selection strategies.
///
/// # Examples
///
/// ```
/// use glitch_ga::ga::{Selection, SelectionStrategy};
/// use glitch_ga::random::create_rng;
///
/// let mut rng = create_rng(42);
/// let idx = Selection::ScalingProportionate.select(&[9.0, 4.0, 1.0], &mut rng);
/// assert!(idx < 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Selection {
    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Selection probability is proportional to the score. Negative scores
    /// are shifted by the generation minimum first, which keeps the order.
    ///
    /// **Warning**: an early super-fit chromosome can dominate the wheel.
    ///
    /// # Complexity
    /// O(n) per selection
    Proportionate,

    /// Proportionate selection on scores rescaled to the generation minimum.
    ///
    /// Weights are `score - min + ε`, so differences between chromosomes
    /// matter rather than absolute magnitudes, and rank order is preserved.
    ///
    /// # Complexity
    /// O(n) per selection
    #[default]
    ScalingProportionate,
}

impl SelectionStrategy for Selection {
    fn select(&self, ranked_scores: &[f64], rng: &mut dyn RngCore) -> usize {
        assert!(
            !ranked_scores.is_empty(),
            "cannot select from empty population"
        );
        if ranked_scores.len() == 1 {
            return 0;
        }

        let weights = match self {
            Selection::Proportionate => proportionate_weights(ranked_scores),
            Selection::ScalingProportionate => scaled_weights(ranked_scores),
        };
        roulette(&weights, rng)
    }
}

/// Raw scores, shifted up when any is negative.
fn proportionate_weights(scores: &[f64]) -> Vec<f64> {
    let min = finite_min(scores);
    let shift = if min < 0.0 { -min } else { 0.0 };
    scores.iter().map(|&s| sanitize(s + shift)).collect()
}

/// Scores relative to the generation minimum, plus a floor so the worst
/// chromosome keeps a non-zero chance.
fn scaled_weights(scores: &[f64]) -> Vec<f64> {
    let min = finite_min(scores);
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let epsilon = ((max - min) * 1e-12).max(1e-12);
    scores.iter().map(|&s| sanitize(s - min + epsilon)).collect()
}

fn finite_min(scores: &[f64]) -> f64 {
    let min = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

fn sanitize(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

/// Roulette wheel over non-negative weights. Uniform if all weights are zero.
fn roulette(weights: &[f64], rng: &mut dyn RngCore) -> usize {
    let n = weights.len();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    // floating-point fallback: last chromosome with a non-zero weight
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(n - 1)
}
