//! Genetic algorithm over glitch waveforms.
//!
//! A chromosome is a piecewise control-point description of a voltage
//! pulse plus the frequency at which it is played. The engine evolves a
//! population of them against a [`FitnessOracle`], which is typically a
//! fault-injection rig or the simulated [`crate::sim::VPulseOracle`].
//!
//! # Core Traits
//!
//! - [`FitnessOracle`]: Scores a chromosome (higher is better)
//! - [`SelectionStrategy`]: Picks a parent index from ranked scores
//! - [`StoppingPolicy`]: Decides when the run halts
//! - [`GenerationObserver`]: Receives per-generation events
//!
//! # Key Types
//!
//! - [`Chromosome`]: Control points and frequency, with identity token
//! - [`GaConfig`]: Algorithm parameters with builder methods
//! - [`Engine`]: Executes the evolutionary loop
//! - [`GaResult`]: Best chromosome and run statistics
//!
//! # Submodules
//!
//! - [`operators`]: Uniform waveform crossover and the mutation suite
//! - [`diversity`]: Pre-generation repair and duplicate breaking
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"

mod chromosome;
mod config;
pub mod diversity;
mod observer;
pub mod operators;
mod runner;
mod selection;
mod stopping;
mod types;

pub use chromosome::{Chromosome, DuplicateRepair, MIN_CHROMOSOME_LENGTH, X_MAX, X_MIN};
pub use config::{GaConfig, NoiseKind, MAX_FREQ, MIN_FREQ};
pub use observer::{BestRecord, FitnessStats, GenerationObserver, LogObserver};
pub use runner::{Engine, GaResult, Ranked, NUM_CX_CHILDREN};
pub use selection::{Selection, SelectionStrategy};
pub use stopping::{AnyOf, MaxIterations, Progress, Stagnation, StoppingPolicy};
pub use types::FitnessOracle;
