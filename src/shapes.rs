//! Basic glitch shapes used to seed a population with plausible pulses.
//!
//! Every shape places `length` points at evenly spaced positions
//! `x_k = (k + 1) / (length + 1)`, so the first and last points stay clear
//! of the virtual endpoints at 0 and 1.

use crate::error::{GaError, Result};
use crate::ga::Chromosome;
use rand::Rng;
use std::f64::consts::PI;

/// A parametric waveform template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Shape {
    /// High edges around a low plateau.
    Rect,
    /// Straight descent to `low` at the centre, then back up.
    V,
    /// One full sine cycle spanning `[low, high]`.
    Sine,
}

impl Shape {
    /// All shapes, in declaration order.
    pub const ALL: [Shape; 3] = [Shape::Rect, Shape::V, Shape::Sine];

    /// Picks a shape uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Control points of this shape.
    ///
    /// # Errors
    /// [`GaError::InvalidShape`] if `length` is zero or the levels do not
    /// satisfy `-1 ≤ low ≤ high ≤ 1`.
    pub fn points(&self, length: usize, high: f64, low: f64) -> Result<Vec<(f64, f64)>> {
        if length == 0 {
            return Err(GaError::InvalidShape("length must be at least 1".into()));
        }
        if !(-1.0..=1.0).contains(&low) || !(-1.0..=1.0).contains(&high) || low > high {
            return Err(GaError::InvalidShape(format!(
                "levels must satisfy -1 <= low <= high <= 1 (got low {low}, high {high})"
            )));
        }

        let step = 1.0 / (length + 1) as f64;
        let centre = (length - 1) as f64 / 2.0;
        let points = (0..length)
            .map(|k| {
                let x = (k + 1) as f64 * step;
                let y = match self {
                    Shape::Rect => {
                        if k == 0 || k == length - 1 {
                            high
                        } else {
                            low
                        }
                    }
                    Shape::V => {
                        if centre == 0.0 {
                            low
                        } else {
                            low + (high - low) * (k as f64 - centre).abs() / centre
                        }
                    }
                    Shape::Sine => {
                        let mid = (high + low) / 2.0;
                        let amplitude = (high - low) / 2.0;
                        mid + amplitude * (2.0 * PI * x).sin()
                    }
                };
                (x, y)
            })
            .collect();
        Ok(points)
    }

    /// Builds a chromosome from this shape.
    pub fn chromosome<R: Rng + ?Sized>(
        &self,
        length: usize,
        high: f64,
        low: f64,
        freq: f64,
        rng: &mut R,
    ) -> Result<Chromosome> {
        Chromosome::from_shape(*self, length, high, low, freq, rng)
    }
}

impl Chromosome {
    /// Creates a chromosome that follows `shape`.
    ///
    /// # Errors
    /// See [`Shape::points`].
    pub fn from_shape<R: Rng + ?Sized>(
        shape: Shape,
        length: usize,
        high: f64,
        low: f64,
        freq: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let points = shape.points(length, high, low)?;
        Ok(Chromosome::from_points(points, freq, rng))
    }
}
