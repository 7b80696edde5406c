//! Error type shared by the engine, the configuration layer and the
//! waveform codec.

use thiserror::Error;

/// Errors surfaced by the glitch search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GaError {
    /// Scoring was requested before any population was seeded.
    #[error("cannot score and rank an empty population")]
    EmptyPopulation,

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encoder parameters are invalid, or a byte stream could not be
    /// decoded into DAC samples.
    #[error("invalid waveform encoding: {0}")]
    InvalidEncoding(String),

    /// Deserialized chromosome data breaks the representation invariants.
    #[error("invalid chromosome: {0}")]
    InvalidChromosome(String),

    /// Shape parameters violate their geometric constraints.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GaError>;
