//! Per-generation observation hooks.
//!
//! Observers are side-effecting sinks: statistics files, dashboards, or the
//! `log`-backed [`LogObserver`]. They never influence the search.

use super::chromosome::Chromosome;
use uuid::Uuid;

/// Score summary of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessStats {
    /// Lowest score.
    pub min: f64,

    /// Arithmetic mean.
    pub mean: f64,

    /// Highest score.
    pub max: f64,
}

impl FitnessStats {
    /// Summarizes `scores`. An empty slice yields all zeros.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                min: 0.0,
                mean: 0.0,
                max: 0.0,
            };
        }
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Self { min, mean, max }
    }
}

/// The best chromosome seen so far and where it came from.
#[derive(Debug, Clone)]
pub struct BestRecord {
    /// Owned copy of the chromosome.
    pub chromosome: Chromosome,

    /// Its score.
    pub score: f64,

    /// Generation whose population contained it (0 = seed population).
    pub generation: usize,
}

/// Receives engine events. All methods default to no-ops.
pub trait GenerationObserver: Send {
    /// Called after each generation with its score summary.
    fn on_fitness(&mut self, _run_id: Uuid, _generation: usize, _stats: &FitnessStats) {}

    /// Called after each generation with the best-ever record.
    fn on_best(&mut self, _run_id: Uuid, _generation: usize, _best: &BestRecord) {}

    /// Called after seeding and after each generation with the full
    /// population. Chromosomes render via `Display`.
    fn on_population(&mut self, _run_id: Uuid, _generation: usize, _population: &[Chromosome]) {}
}

/// Writes generation events through the `log` facade.
///
/// | event | target | level |
/// |---|---|---|
/// | statistics `run,gen,max,mean,min` | `glitch_ga::stats` | info |
/// | best chromosome | `glitch_ga::best` | info |
/// | population dump | `glitch_ga::population` | info |
///
/// The population dump is off by default because it is large.
#[derive(Debug, Clone, Default)]
pub struct LogObserver {
    log_population: bool,
}

impl LogObserver {
    /// Creates an observer that logs statistics and the best chromosome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also dump every chromosome each generation.
    pub fn with_population(mut self, enabled: bool) -> Self {
        self.log_population = enabled;
        self
    }
}

impl GenerationObserver for LogObserver {
    fn on_fitness(&mut self, run_id: Uuid, generation: usize, stats: &FitnessStats) {
        log::info!(target: "glitch_ga::stats", "{}", stats_line(run_id, generation, stats));
    }

    fn on_best(&mut self, run_id: Uuid, generation: usize, best: &BestRecord) {
        log::info!(target: "glitch_ga::best", "{}", best_line(run_id, generation, best));
    }

    fn on_population(&mut self, run_id: Uuid, generation: usize, population: &[Chromosome]) {
        if !self.log_population {
            return;
        }
        log::info!(
            target: "glitch_ga::population",
            "{}",
            population_line(run_id, generation, population)
        );
    }
}

/// `run,gen,max,mean,min` record.
fn stats_line(run_id: Uuid, generation: usize, stats: &FitnessStats) -> String {
    format!(
        "{},{},{:.6},{:.6},{:.6}",
        run_id, generation, stats.max, stats.mean, stats.min
    )
}

fn best_line(run_id: Uuid, generation: usize, best: &BestRecord) -> String {
    format!(
        "{}: iteration {}, best chromosome so far is from iteration {}: {} (fitness {:.6})",
        run_id, generation, best.generation, best.chromosome, best.score
    )
}

fn population_line(run_id: Uuid, generation: usize, population: &[Chromosome]) -> String {
    let dump: Vec<String> = population.iter().map(ToString::to_string).collect();
    format!("{}: {}: [{}]", run_id, generation, dump.join(", "))
}
