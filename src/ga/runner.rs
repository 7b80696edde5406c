//! GA evolutionary loop execution.
//!
//! [`Engine`] owns the population and drives the generation cycle:
//! seeding → {pre-generate → generate → post-generate}* → result.
//!
//! - **pre-generate**: repair every genome, break up duplicates, score.
//! - **generate**: elites, then crossover/selection + mutation up to the
//!   quota, then fresh random injections.
//! - **post-generate**: swap in the new population, score it, record the
//!   generation best and notify observers.

use super::chromosome::{triangular_freq, Chromosome};
use super::config::GaConfig;
use super::diversity::{perturb_duplicates, repair_population};
use super::observer::{BestRecord, FitnessStats, GenerationObserver};
use super::operators::{mutate, uniform_waveform_crossover};
use super::selection::SelectionStrategy;
use super::stopping::{AnyOf, MaxIterations, Progress, Stagnation, StoppingPolicy};
use super::types::FitnessOracle;
use crate::error::{GaError, Result};
use crate::random::{create_rng, random_uuid};
use crate::shapes::Shape;
use rand::rngs::StdRng;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Number of chromosomes produced per breeding step.
pub const NUM_CX_CHILDREN: usize = 2;

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best chromosome observed during the entire run.
    pub best: Chromosome,

    /// Score of `best`.
    pub best_score: f64,

    /// Generation whose population produced `best` (0 = seed population).
    pub generation_of_best: usize,

    /// Number of completed generations.
    pub generations: usize,

    /// Whether the stopping policy ended the run before `max_iterations`.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best score of each completed generation.
    pub fitness_history: Vec<f64>,
}

/// A population position paired with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index into the current population.
    pub index: usize,

    /// Fitness of that chromosome.
    pub score: f64,
}

/// The generational engine.
///
/// # Usage
///
/// ```
/// use glitch_ga::ga::{Engine, GaConfig};
/// use glitch_ga::sim::VPulseOracle;
///
/// let config = GaConfig::default()
///     .with_population_size(12)
///     .with_max_iterations(3)
///     .with_seed(42);
/// let mut engine = Engine::new(config, VPulseOracle::default()).unwrap();
/// let result = engine.solve().unwrap();
/// assert_eq!(result.generations, 3);
/// assert!(result.best.is_well_formed());
/// ```
pub struct Engine<F: FitnessOracle> {
    run_id: Uuid,
    config: GaConfig,
    oracle: F,
    rng: StdRng,
    selection: Box<dyn SelectionStrategy>,
    stopping: Box<dyn StoppingPolicy>,
    observers: Vec<Box<dyn GenerationObserver>>,
    iteration: usize,
    population: Option<Vec<Chromosome>>,
    population_generation: usize,
    scores: Vec<Option<f64>>,
    ranked: Vec<Ranked>,
    next_generation: Vec<Chromosome>,
    best: Option<BestRecord>,
    best_history: Vec<f64>,
}

impl<F: FitnessOracle> Engine<F> {
    /// Creates an engine after validating `config`.
    ///
    /// `max_iterations` is floored at 1. The selection strategy comes from
    /// `config.selection`; the stopping policy is the iteration cap plus
    /// stagnation detection (unless `lookback` is 0).
    pub fn new(mut config: GaConfig, oracle: F) -> Result<Self> {
        config.max_iterations = config.max_iterations.max(1);
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        let run_id = random_uuid(&mut rng);
        let selection: Box<dyn SelectionStrategy> = Box::new(config.selection);
        let stopping: Box<dyn StoppingPolicy> = Box::new(default_stopping(&config));

        Ok(Self {
            run_id,
            config,
            oracle,
            rng,
            selection,
            stopping,
            observers: Vec::new(),
            iteration: 0,
            population: None,
            population_generation: 0,
            scores: Vec::new(),
            ranked: Vec::new(),
            next_generation: Vec::new(),
            best: None,
            best_history: Vec::new(),
        })
    }

    /// Replaces the selection strategy.
    pub fn with_selection(mut self, selection: impl SelectionStrategy + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Replaces the stopping policy. The `max_iterations` cap still applies.
    pub fn with_stopping(mut self, stopping: impl StoppingPolicy + 'static) -> Self {
        self.stopping = Box::new(stopping);
        self
    }

    /// Adds an observer.
    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Identifier of this run, reported to observers.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The validated configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Number of generations started so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current population, if seeded.
    pub fn population(&self) -> Option<&[Chromosome]> {
        self.population.as_deref()
    }

    /// Best score of each completed generation.
    pub fn best_history(&self) -> &[f64] {
        &self.best_history
    }

    /// The best chromosome observed across the run, with its score and the
    /// generation that produced it.
    pub fn best(&self) -> Option<&BestRecord> {
        self.best.as_ref()
    }

    /// Replaces the current population and drops all cached scores.
    ///
    /// Chromosomes scored from now on are attributed to the current
    /// iteration, which is 0 before the first generation.
    pub fn set_population(&mut self, population: Vec<Chromosome>) {
        self.population_generation = self.iteration;
        self.scores = vec![None; population.len()];
        self.ranked.clear();
        self.population = Some(population);
    }

    /// Creates the initial population if none exists.
    pub fn seed(&mut self) {
        if self.population.is_some() {
            return;
        }
        let population: Vec<Chromosome> = (0..self.config.population_size)
            .map(|_| seed_chromosome(&self.config, &mut self.rng))
            .collect();
        self.set_population(population);

        if let Some(population) = self.population.as_deref() {
            for observer in self.observers.iter_mut() {
                observer.on_population(self.run_id, self.iteration, population);
            }
        }
    }

    /// Runs until the stopping policy or the iteration cap ends the run.
    pub fn solve(&mut self) -> Result<GaResult> {
        self.solve_with_cancel(None)
    }

    /// Runs with an optional cancellation flag.
    ///
    /// The flag is checked before every generation and again before the new
    /// population is swapped in. A cancelled generation is discarded and the
    /// best chromosome found so far is returned.
    pub fn solve_with_cancel(&mut self, cancel: Option<Arc<AtomicBool>>) -> Result<GaResult> {
        self.seed();
        log::info!(
            "run {} started: population {}, up to {} generations",
            self.run_id,
            self.config.population_size,
            self.config.max_iterations
        );

        let mut cancelled = false;
        loop {
            if is_cancelled(&cancel) {
                cancelled = true;
                break;
            }
            if self.is_finished() {
                break;
            }

            self.iteration += 1;
            self.pre_generate()?;
            self.generate()?;

            if is_cancelled(&cancel) {
                self.next_generation.clear();
                cancelled = true;
                break;
            }

            self.post_generate()?;
            log::debug!("iteration {} finished", self.iteration);
        }

        if cancelled {
            log::info!(
                "run {} cancelled after {} generations",
                self.run_id,
                self.best_history.len()
            );
        }
        if self.best.is_none() {
            self.score_population()?;
        }
        let best = self.best.clone().ok_or(GaError::EmptyPopulation)?;

        Ok(GaResult {
            best: best.chromosome,
            best_score: best.score,
            generation_of_best: best.generation,
            generations: self.best_history.len(),
            stagnated: !cancelled && self.iteration < self.config.max_iterations,
            cancelled,
            fitness_history: self.best_history.clone(),
        })
    }

    /// Whether the iteration cap or the stopping policy ends the run.
    pub fn is_finished(&self) -> bool {
        if self.iteration >= self.config.max_iterations {
            return true;
        }
        self.stopping.is_finished(&Progress {
            generation: self.iteration,
            best_history: &self.best_history,
        })
    }

    /// Repairs the population, breaks up duplicate genomes and ranks it.
    pub fn pre_generate(&mut self) -> Result<()> {
        let Self {
            population,
            config,
            rng,
            scores,
            ..
        } = self;
        let population = population.as_mut().ok_or(GaError::EmptyPopulation)?;

        let repaired = repair_population(population, config, rng);
        let perturbed = perturb_duplicates(population, config, rng);
        for i in repaired.into_iter().chain(perturbed) {
            scores[i] = None;
        }

        self.ranked = self.score_population()?;
        Ok(())
    }

    /// Fills the next-generation buffer.
    ///
    /// Elites are copied unchanged; the rest of the quota is bred by
    /// crossover (probability `crossover_prob`) or direct selection, each
    /// child mutated; `add_random_num` fresh chromosomes complete it.
    pub fn generate(&mut self) -> Result<()> {
        if self.ranked.is_empty() {
            self.ranked = self.score_population()?;
        }

        let Self {
            population,
            config,
            rng,
            selection,
            ranked,
            next_generation,
            ..
        } = self;
        let population = population.as_ref().ok_or(GaError::EmptyPopulation)?;
        let ranked_scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        let capacity = config.population_size - config.add_random_num;

        next_generation.clear();
        for r in ranked.iter().take(config.elite_count()) {
            next_generation.push(population[r.index].clone());
        }

        while next_generation.len() < capacity {
            let children: Vec<Chromosome> = if rng.random_bool(config.crossover_prob) {
                let first = ranked[selection.select(&ranked_scores, &mut *rng)].index;
                let parent1 = &population[first];
                let parent2 = select_distinct(
                    parent1,
                    population,
                    ranked,
                    &ranked_scores,
                    &**selection,
                    config,
                    rng,
                );
                let (c1, c2) = uniform_waveform_crossover(parent1, &parent2, config, rng);
                vec![c1, c2]
            } else {
                (0..NUM_CX_CHILDREN)
                    .map(|_| {
                        let pick = ranked[selection.select(&ranked_scores, &mut *rng)].index;
                        population[pick].clone()
                    })
                    .collect()
            };

            for mut child in children {
                if next_generation.len() >= capacity {
                    break;
                }
                mutate(&mut child, config, rng);
                next_generation.push(child);
            }
        }

        for _ in 0..config.add_random_num {
            next_generation.push(random_chromosome(config, rng));
        }
        Ok(())
    }

    /// Swaps in the new population, scores it and notifies observers.
    pub fn post_generate(&mut self) -> Result<()> {
        let next = std::mem::take(&mut self.next_generation);
        self.set_population(next);

        let ranked = self.score_population()?;
        let generation_best = ranked.first().map(|r| r.score).unwrap_or(f64::NAN);
        self.best_history.push(generation_best);

        let all_scores: Vec<f64> = self.scores.iter().flatten().copied().collect();
        let stats = FitnessStats::from_scores(&all_scores);
        let run_id = self.run_id;
        let generation = self.iteration;
        for observer in self.observers.iter_mut() {
            observer.on_fitness(run_id, generation, &stats);
            if let Some(best) = &self.best {
                observer.on_best(run_id, generation, best);
            }
            if let Some(population) = self.population.as_deref() {
                observer.on_population(run_id, generation, population);
            }
        }
        Ok(())
    }

    /// Scores the population and returns it ranked best first, with the
    /// worst `remove_worst_size` chromosomes dropped.
    ///
    /// Only chromosomes without a cached score are sent to the oracle. With
    /// the `parallel` feature and `config.parallel`, they are scored
    /// concurrently; the call returns once every score is in.
    ///
    /// # Errors
    /// [`GaError::EmptyPopulation`] if no population has been seeded.
    pub fn score_population(&mut self) -> Result<Vec<Ranked>> {
        let population = match self.population.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(GaError::EmptyPopulation),
        };

        let missing: Vec<usize> = (0..population.len())
            .filter(|&i| self.scores[i].is_none())
            .collect();
        let batch: Vec<&Chromosome> = missing.iter().map(|&i| &population[i]).collect();
        let fresh = score_batch(&self.oracle, &batch, self.config.parallel);

        for (&i, &score) in missing.iter().zip(fresh.iter()) {
            self.scores[i] = Some(score);
            let improves = match &self.best {
                None => true,
                Some(best) => score > best.score || best.score.is_nan(),
            };
            if improves {
                self.best = Some(BestRecord {
                    chromosome: population[i].clone(),
                    score,
                    generation: self.population_generation,
                });
            }
        }

        let mut ranked: Vec<Ranked> = self
            .scores
            .iter()
            .enumerate()
            .filter_map(|(index, s)| s.map(|score| Ranked { index, score }))
            .collect();
        ranked.sort_by(|a, b| rank_key(b.score).total_cmp(&rank_key(a.score)));
        let keep = ranked.len().saturating_sub(self.config.remove_worst_size).max(1);
        ranked.truncate(keep);
        Ok(ranked)
    }
}

/// Picks a second parent whose content differs from `first`.
///
/// Gives up after `population.len()` attempts and falls back to a fresh
/// random chromosome.
fn select_distinct<'a>(
    first: &Chromosome,
    population: &'a [Chromosome],
    ranked: &[Ranked],
    ranked_scores: &[f64],
    selection: &dyn SelectionStrategy,
    config: &GaConfig,
    rng: &mut StdRng,
) -> Cow<'a, Chromosome> {
    for _ in 0..population.len() {
        let candidate = &population[ranked[selection.select(ranked_scores, &mut *rng)].index];
        if !candidate.same_shape(first) {
            return Cow::Borrowed(candidate);
        }
    }
    log::debug!(
        "no distinct second parent after {} attempts; using a random chromosome",
        population.len()
    );
    Cow::Owned(random_chromosome(config, rng))
}

/// Iteration cap plus stagnation detection.
fn default_stopping(config: &GaConfig) -> AnyOf {
    let policy = AnyOf::new().with(MaxIterations::new(config.max_iterations));
    if config.lookback > 0 {
        policy.with(Stagnation::new(config.lookback, config.threshold))
    } else {
        policy
    }
}

/// Factory for random injections and fallback parents.
fn random_chromosome<R: Rng + ?Sized>(config: &GaConfig, rng: &mut R) -> Chromosome {
    Chromosome::random(config.chromosome_length, config.min_freq, config.max_freq, rng)
}

/// Factory for the initial population.
fn seed_chromosome<R: Rng + ?Sized>(config: &GaConfig, rng: &mut R) -> Chromosome {
    if !config.seed_shapes {
        return random_chromosome(config, rng);
    }
    let shape = Shape::random(rng);
    let a: f64 = rng.random_range(-1.0..=1.0);
    let b: f64 = rng.random_range(-1.0..=1.0);
    let freq = triangular_freq(config.min_freq, config.max_freq, rng);
    match shape.chromosome(config.chromosome_length, a.max(b), a.min(b), freq, rng) {
        Ok(chromosome) => chromosome,
        Err(_) => random_chromosome(config, rng),
    }
}

/// NaN scores rank below everything else.
fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

fn is_cancelled(cancel: &Option<Arc<AtomicBool>>) -> bool {
    cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(feature = "parallel")]
fn score_batch<F: FitnessOracle>(oracle: &F, batch: &[&Chromosome], parallel: bool) -> Vec<f64> {
    if parallel {
        batch.par_iter().map(|c| oracle.score(c)).collect()
    } else {
        batch.iter().map(|c| oracle.score(c)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn score_batch<F: FitnessOracle>(oracle: &F, batch: &[&Chromosome], _parallel: bool) -> Vec<f64> {
    batch.iter().map(|c| oracle.score(c)).collect()
}

// ============================================================================
// Tests
// ============================================================================
