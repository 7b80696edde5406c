//! Stopping policies.
//!
//! A [`StoppingPolicy`] is consulted once before every generation. The
//! engine additionally enforces its `max_iterations` cap, so a policy can
//! only shorten a run.

/// Snapshot of run progress handed to a stopping policy.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Number of generations completed so far.
    pub generation: usize,

    /// Best score of each completed generation, oldest first.
    pub best_history: &'a [f64],
}

/// Decides whether the run should halt.
pub trait StoppingPolicy: Send + Sync {
    /// Returns `true` when the run should stop before the next generation.
    fn is_finished(&self, progress: &Progress<'_>) -> bool;
}

/// Stops once `generation` reaches the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxIterations(pub usize);

impl MaxIterations {
    /// Creates a cap, floored at one generation.
    pub fn new(max: usize) -> Self {
        Self(max.max(1))
    }
}

impl StoppingPolicy for MaxIterations {
    fn is_finished(&self, progress: &Progress<'_>) -> bool {
        progress.generation >= self.0.max(1)
    }
}

/// Stops when the best score has plateaued.
///
/// Once more than `lookback` generation bests are recorded, the latest best
/// is compared against each of the `lookback - 1` entries before it. If no
/// gain exceeds `threshold`, progress has stalled.
///
/// # Examples
///
/// ```
/// use glitch_ga::ga::Stagnation;
///
/// let policy = Stagnation::new(4, 0.0001);
/// assert!(policy.has_plateaued(&[1.0, 1.0, 1.0, 1.0, 1.0]));
/// assert!(!policy.has_plateaued(&[1.0, 2.0, 3.0, 4.0, 5.0]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stagnation {
    /// Window size.
    pub lookback: usize,

    /// Minimum absolute gain that counts as progress.
    pub threshold: f64,
}

impl Stagnation {
    /// Creates a stagnation policy.
    pub fn new(lookback: usize, threshold: f64) -> Self {
        Self { lookback, threshold }
    }

    /// Evaluates the plateau condition on a best-score history.
    pub fn has_plateaued(&self, history: &[f64]) -> bool {
        if self.lookback < 2 || history.len() <= self.lookback {
            return false;
        }
        let n = history.len();
        let last = history[n - 1];
        history[n - self.lookback..n - 1]
            .iter()
            .all(|&previous| last - previous <= self.threshold)
    }
}

impl StoppingPolicy for Stagnation {
    fn is_finished(&self, progress: &Progress<'_>) -> bool {
        let plateaued = self.has_plateaued(progress.best_history);
        if plateaued {
            log::info!(
                "stopping at generation {}: no gain above {} over the last {} generations",
                progress.generation,
                self.threshold,
                self.lookback
            );
        }
        plateaued
    }
}

/// Stops as soon as any inner policy stops.
pub struct AnyOf(pub Vec<Box<dyn StoppingPolicy>>);

impl AnyOf {
    /// Creates an empty composition (never stops on its own).
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a policy.
    pub fn with(mut self, policy: impl StoppingPolicy + 'static) -> Self {
        self.0.push(Box::new(policy));
        self
    }
}

impl Default for AnyOf {
    fn default() -> Self {
        Self::new()
    }
}

impl StoppingPolicy for AnyOf {
    fn is_finished(&self, progress: &Progress<'_>) -> bool {
        self.0.iter().any(|p| p.is_finished(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(generation: usize, history: &[f64]) -> Progress<'_> {
        Progress {
            generation,
            best_history: history,
        }
    }

    #[test]
    fn test_stagnation_flat_history_finishes() {
        let policy = Stagnation::new(4, 0.0001);
        assert!(policy.is_finished(&progress(5, &[1.0, 1.0, 1.0, 1.0, 1.0])));
    }

    #[test]
    fn test_stagnation_rising_history_continues() {
        let policy = Stagnation::new(4, 0.0001);
        assert!(!policy.is_finished(&progress(5, &[1.0, 2.0, 3.0, 4.0, 5.0])));
    }

    #[test]
    fn test_stagnation_needs_more_than_lookback_entries() {
        let policy = Stagnation::new(4, 0.0001);
        assert!(!policy.has_plateaued(&[1.0, 1.0, 1.0, 1.0]));
        assert!(!policy.has_plateaued(&[]));
    }

    #[test]
    fn test_stagnation_single_gain_above_threshold_continues() {
        let policy = Stagnation::new(4, 0.5);
        // latest gains vs [1.0, 2.0, 2.9]: 2.0, 1.0, 0.1 -> progress
        assert!(!policy.has_plateaued(&[0.0, 1.0, 2.0, 2.9, 3.0]));
        // gains vs [2.8, 2.9, 2.95]: all <= 0.5 -> plateau
        assert!(policy.has_plateaued(&[0.0, 2.8, 2.9, 2.95, 3.0]));
    }

    #[test]
    fn test_stagnation_ignores_older_entries() {
        let policy = Stagnation::new(3, 0.01);
        // entry 0 is outside the window
        assert!(policy.has_plateaued(&[-100.0, 5.0, 5.0, 5.0]));
    }

    #[test]
    fn test_stagnation_disabled_below_two() {
        assert!(!Stagnation::new(0, 1.0).has_plateaued(&[1.0, 1.0, 1.0]));
        assert!(!Stagnation::new(1, 1.0).has_plateaued(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_max_iterations() {
        let policy = MaxIterations::new(3);
        assert!(!policy.is_finished(&progress(2, &[])));
        assert!(policy.is_finished(&progress(3, &[])));
        assert_eq!(MaxIterations::new(0), MaxIterations(1));
    }

    #[test]
    fn test_any_of() {
        let policy = AnyOf::new()
            .with(MaxIterations::new(10))
            .with(Stagnation::new(2, 0.0));
        assert!(!policy.is_finished(&progress(3, &[1.0, 2.0, 3.0])));
        assert!(policy.is_finished(&progress(3, &[1.0, 3.0, 3.0])));
        assert!(policy.is_finished(&progress(10, &[1.0, 2.0, 3.0])));
        assert!(!AnyOf::default().is_finished(&progress(1000, &[1.0; 50])));
    }
}
