//! GA configuration.
//!
//! [`GaConfig`] holds every parameter that controls the evolutionary loop.
//! It is validated once when the [`Engine`](super::Engine) is built and is
//! not mutated afterwards.

use super::chromosome::{DuplicateRepair, MIN_CHROMOSOME_LENGTH};
use super::selection::Selection;
use crate::error::{GaError, Result};

/// Lowest frequency drawn for a new chromosome, in Hz.
pub const MIN_FREQ: f64 = 1e6;

/// Highest frequency drawn for a new chromosome, in Hz.
pub const MAX_FREQ: f64 = 25e6;

/// Shape of the zero-mean noise used by the jitter mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NoiseKind {
    /// Standard normal noise.
    #[default]
    Gaussian,

    /// Uniform noise on `[-1, 1]`.
    Uniform,
}

/// Configuration for the glitch GA.
///
/// # Defaults
///
/// ```
/// use glitch_ga::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.max_iterations, 100);
/// assert_eq!(config.chromosome_length, 9);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use glitch_ga::ga::{GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(80)
///     .with_selection(Selection::Proportionate)
///     .with_elitism_pct(0.05)
///     .with_crossover_prob(0.9);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Loading from a flat mapping
///
/// With the `serde` feature, unknown keys are ignored and missing keys fall
/// back to the defaults above.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Number of chromosomes in the population.
    pub population_size: usize,

    /// Probability that a breeding step uses crossover (0.0–1.0).
    ///
    /// Otherwise two chromosomes are selected and passed on directly.
    pub crossover_prob: f64,

    /// Probability of the point-jitter sub-mutation.
    pub mutation_prob: f64,

    /// Probability of swapping the y values of two adjacent points.
    pub swap_prob: f64,

    /// Probability of a structural mutation (add or remove one point).
    pub structural_prob: f64,

    /// Probability of the frequency-jitter sub-mutation.
    pub freq_mutation_prob: f64,

    /// Probability of recombining with a fresh random chromosome.
    pub macro_crossover_prob: f64,

    /// Scale of the point-jitter noise on y.
    pub mutation_size: f64,

    /// Scale of the frequency-jitter noise, in Hz.
    pub freq_mutation_size: f64,

    /// Noise distribution for the jitter mutations.
    pub noise: NoiseKind,

    /// Maximum number of generations. Floored at 1.
    pub max_iterations: usize,

    /// Number of worst-ranked chromosomes excluded from selection.
    /// Also read from the `replace_worst_num` key.
    #[cfg_attr(feature = "serde", serde(alias = "replace_worst_num"))]
    pub remove_worst_size: usize,

    /// Number of fresh random chromosomes injected every generation.
    pub add_random_num: usize,

    /// Fraction of the population copied unchanged into the next generation.
    pub elitism_pct: f64,

    /// Stagnation gain floor: if the latest best beats none of the previous
    /// `lookback - 1` bests by more than this, the run stops.
    pub threshold: f64,

    /// Stagnation window. Set to 0 to disable stagnation-based stopping.
    pub lookback: usize,

    /// Number of control points in a freshly created chromosome.
    /// Also read from the `chromosome_length_initial` key.
    #[cfg_attr(feature = "serde", serde(alias = "chromosome_length_initial"))]
    pub chromosome_length: usize,

    /// Structural mutation never shrinks a chromosome below this length.
    pub min_chromosome_length: usize,

    /// Lower bound of the frequency range, in Hz.
    pub min_freq: f64,

    /// Upper bound (and triangular mode) of the frequency range, in Hz.
    pub max_freq: f64,

    /// Selection strategy used unless one is injected into the engine.
    pub selection: Selection,

    /// Duplicate-x resolution policy.
    pub duplicate_repair: DuplicateRepair,

    /// Skip crossover swaps that would introduce a duplicate x.
    pub crossover_guard_duplicates: bool,

    /// Noise scale applied to x and y when breaking up duplicate genomes.
    pub diversity_noise: f64,

    /// Noise scale applied to the frequency of a duplicate genome, in Hz.
    pub freq_diversity_noise: f64,

    /// Seed the initial population from the basic glitch shapes instead of
    /// uniformly random points.
    pub seed_shapes: bool,

    /// Random seed for reproducibility. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Score chromosomes in parallel using rayon (requires the `parallel`
    /// feature).
    pub parallel: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            crossover_prob: 0.8,
            mutation_prob: 0.2,
            swap_prob: 0.1,
            structural_prob: 0.1,
            freq_mutation_prob: 0.2,
            macro_crossover_prob: 0.02,
            mutation_size: 0.1,
            freq_mutation_size: 1e6,
            noise: NoiseKind::default(),
            max_iterations: 100,
            remove_worst_size: 3,
            add_random_num: 2,
            elitism_pct: 0.1,
            threshold: 0.0001,
            lookback: 20,
            chromosome_length: 9,
            min_chromosome_length: MIN_CHROMOSOME_LENGTH,
            min_freq: MIN_FREQ,
            max_freq: MAX_FREQ,
            selection: Selection::default(),
            duplicate_repair: DuplicateRepair::default(),
            crossover_guard_duplicates: false,
            diversity_noise: 0.01,
            freq_diversity_noise: 1e4,
            seed_shapes: false,
            seed: None,
            parallel: true,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the crossover probability.
    pub fn with_crossover_prob(mut self, p: f64) -> Self {
        self.crossover_prob = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the point-jitter mutation probability.
    pub fn with_mutation_prob(mut self, p: f64) -> Self {
        self.mutation_prob = p.clamp(0.0, 1.0);
        self
    }

    /// Sets all sub-mutation probabilities at once.
    pub fn with_mutation_probs(
        mut self,
        point: f64,
        swap: f64,
        structural: f64,
        freq: f64,
        macro_crossover: f64,
    ) -> Self {
        self.mutation_prob = point.clamp(0.0, 1.0);
        self.swap_prob = swap.clamp(0.0, 1.0);
        self.structural_prob = structural.clamp(0.0, 1.0);
        self.freq_mutation_prob = freq.clamp(0.0, 1.0);
        self.macro_crossover_prob = macro_crossover.clamp(0.0, 1.0);
        self
    }

    /// Sets the noise distribution for the jitter mutations.
    pub fn with_noise(mut self, noise: NoiseKind) -> Self {
        self.noise = noise;
        self
    }

    /// Sets the maximum number of generations (floored at 1).
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n.max(1);
        self
    }

    /// Sets the number of worst chromosomes excluded from selection.
    pub fn with_remove_worst_size(mut self, n: usize) -> Self {
        self.remove_worst_size = n;
        self
    }

    /// Sets the number of random chromosomes injected each generation.
    pub fn with_add_random_num(mut self, n: usize) -> Self {
        self.add_random_num = n;
        self
    }

    /// Sets the elite fraction.
    pub fn with_elitism_pct(mut self, pct: f64) -> Self {
        self.elitism_pct = pct.clamp(0.0, 1.0);
        self
    }

    /// Sets the stagnation window and gain floor.
    pub fn with_stagnation(mut self, lookback: usize, threshold: f64) -> Self {
        self.lookback = lookback;
        self.threshold = threshold;
        self
    }

    /// Sets the initial chromosome length.
    pub fn with_chromosome_length(mut self, n: usize) -> Self {
        self.chromosome_length = n;
        self
    }

    /// Sets the minimum chromosome length for structural mutation.
    pub fn with_min_chromosome_length(mut self, n: usize) -> Self {
        self.min_chromosome_length = n;
        self
    }

    /// Sets the frequency range.
    pub fn with_freq_range(mut self, min: f64, max: f64) -> Self {
        self.min_freq = min;
        self.max_freq = max;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the duplicate-x repair policy.
    pub fn with_duplicate_repair(mut self, policy: DuplicateRepair) -> Self {
        self.duplicate_repair = policy;
        self
    }

    /// Enables or disables the duplicate guard in crossover.
    pub fn with_crossover_guard(mut self, guard: bool) -> Self {
        self.crossover_guard_duplicates = guard;
        self
    }

    /// Enables or disables shape-based seeding.
    pub fn with_seed_shapes(mut self, enabled: bool) -> Self {
        self.seed_shapes = enabled;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel scoring.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of elites copied unchanged each generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elitism_pct) as usize
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: &str) -> Result<()> {
            Err(GaError::InvalidConfig(msg.into()))
        }

        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        if self.chromosome_length < MIN_CHROMOSOME_LENGTH {
            return invalid("chromosome_length must be at least 4");
        }
        if self.min_chromosome_length == 0 || self.min_chromosome_length > self.chromosome_length {
            return invalid("min_chromosome_length must be in 1..=chromosome_length");
        }
        let probs = [
            ("crossover_prob", self.crossover_prob),
            ("mutation_prob", self.mutation_prob),
            ("swap_prob", self.swap_prob),
            ("structural_prob", self.structural_prob),
            ("freq_mutation_prob", self.freq_mutation_prob),
            ("macro_crossover_prob", self.macro_crossover_prob),
            ("elitism_pct", self.elitism_pct),
        ];
        for (name, p) in probs {
            if !(0.0..=1.0).contains(&p) {
                return Err(GaError::InvalidConfig(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if self.elite_count() + self.add_random_num >= self.population_size {
            return invalid("elites and random injections fill the entire population");
        }
        if self.remove_worst_size >= self.population_size {
            return invalid("remove_worst_size must leave at least one selectable chromosome");
        }
        if !(self.min_freq > 0.0 && self.min_freq < self.max_freq) {
            return invalid("frequency range must satisfy 0 < min_freq < max_freq");
        }
        if self.mutation_size < 0.0
            || self.freq_mutation_size < 0.0
            || self.diversity_noise < 0.0
            || self.freq_diversity_noise < 0.0
        {
            return invalid("noise sizes must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 50);
        assert!((config.crossover_prob - 0.8).abs() < 1e-10);
        assert!((config.mutation_prob - 0.2).abs() < 1e-10);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.remove_worst_size, 3);
        assert_eq!(config.lookback, 20);
        assert!((config.threshold - 0.0001).abs() < 1e-15);
        assert_eq!(config.chromosome_length, 9);
        assert_eq!(config.selection, Selection::ScalingProportionate);
        assert_eq!(config.duplicate_repair, DuplicateRepair::Replace);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(20)
            .with_crossover_prob(1.0)
            .with_max_iterations(7)
            .with_stagnation(5, 0.01)
            .with_chromosome_length(6)
            .with_selection(Selection::Proportionate)
            .with_noise(NoiseKind::Uniform)
            .with_seed(42)
            .with_parallel(false);

        assert_eq!(config.population_size, 20);
        assert!((config.crossover_prob - 1.0).abs() < 1e-10);
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.lookback, 5);
        assert_eq!(config.chromosome_length, 6);
        assert_eq!(config.selection, Selection::Proportionate);
        assert_eq!(config.noise, NoiseKind::Uniform);
        assert_eq!(config.seed, Some(42));
        assert!(!config.parallel);
    }

    #[test]
    fn test_max_iterations_floored() {
        let config = GaConfig::default().with_max_iterations(0);
        assert_eq!(config.max_iterations, 1);
    }

    #[test]
    fn test_clamp_probabilities() {
        let config = GaConfig::default()
            .with_crossover_prob(1.5)
            .with_mutation_prob(-0.5)
            .with_elitism_pct(3.0);
        assert!((config.crossover_prob - 1.0).abs() < 1e-10);
        assert!((config.mutation_prob - 0.0).abs() < 1e-10);
        assert!((config.elitism_pct - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GaConfig::default().with_population_size(1);
        assert!(matches!(config.validate(), Err(GaError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_short_chromosome() {
        let config = GaConfig::default().with_chromosome_length(3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_min_length_above_initial() {
        let config = GaConfig::default()
            .with_chromosome_length(5)
            .with_min_chromosome_length(6);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_quota_overflow() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_elitism_pct(0.5)
            .with_add_random_num(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_remove_worst_too_large() {
        let config = GaConfig::default()
            .with_population_size(10)
            .with_remove_worst_size(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_freq_range() {
        assert!(GaConfig::default().with_freq_range(5e6, 5e6).validate().is_err());
        assert!(GaConfig::default().with_freq_range(0.0, 5e6).validate().is_err());
    }

    #[test]
    fn test_validate_raw_probability_out_of_range() {
        let config = GaConfig {
            swap_prob: 1.2,
            ..GaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_elite_count_floors() {
        let config = GaConfig::default()
            .with_population_size(15)
            .with_elitism_pct(0.1);
        assert_eq!(config.elite_count(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_flat_mapping_ignores_unknown_keys() {
        let json = r#"{
            "population_size": 30,
            "crossover_prob": 0.6,
            "selection": "proportionate",
            "stats_file": "stats.txt"
        }"#;
        let config: GaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.population_size, 30);
        assert!((config.crossover_prob - 0.6).abs() < 1e-10);
        assert_eq!(config.selection, Selection::Proportionate);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.lookback, 20);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_flat_mapping_accepts_legacy_key_names() {
        let json = r#"{
            "population_size": 30,
            "replace_worst_num": 5,
            "chromosome_length_initial": 12
        }"#;
        let config: GaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.remove_worst_size, 5);
        assert_eq!(config.chromosome_length, 12);
        assert!(config.validate().is_ok());

        let json = r#"{ "remove_worst_size": 4, "chromosome_length": 7 }"#;
        let config: GaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.remove_worst_size, 4);
        assert_eq!(config.chromosome_length, 7);
    }
}
