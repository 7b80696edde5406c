//! Genetic search for voltage fault-injection glitches.
//!
//! Evolves piecewise glitch waveforms (control points plus a playback
//! frequency) against a fitness oracle:
//!
//! - **GA** ([`ga`]): chromosome model, uniform waveform crossover, the
//!   mutation suite, diversity maintenance, selection and stopping
//!   strategies, and the generational [`ga::Engine`].
//! - **Waveform** ([`waveform`]): interpolation of control points into a
//!   dense waveform and the fixed-width DAC encoding.
//! - **Simulation** ([`sim`]): an offline oracle that rewards matching a
//!   V-shaped target pulse at a target frequency.
//! - **Shapes** ([`shapes`]): rectangular, V and sine seeds.
//!
//! # Architecture
//!
//! The crate knows nothing about the hardware that plays or evaluates a
//! glitch. Consumers plug in a [`ga::FitnessOracle`] and, when needed,
//! feed [`waveform::WaveformEncoder::encode`] output to their signal
//! generator.

pub mod error;
pub mod ga;
pub mod random;
pub mod shapes;
pub mod sim;
pub mod waveform;

pub use error::{GaError, Result};
