//! Simulated fitness oracle.
//!
//! Stands in for a hardware fault-injection rig: a glitch scores high when
//! its waveform tracks a V-shaped target pulse and its frequency sits close
//! to a target frequency. Useful for tuning GA parameters offline.

use crate::error::{GaError, Result};
use crate::ga::{Chromosome, FitnessOracle};
use crate::waveform::{linear_interpolate, sample_positions};

/// Sample resolution of the default oracle. Coarser than the DAC so that
/// offline runs stay fast.
pub const DEFAULT_SIM_SAMPLES: usize = 1024;

/// Samples a V-shaped pulse: zero, then a linear dip of `depth` centred on
/// `location` with total `width`, then zero again.
///
/// # Errors
/// [`GaError::InvalidShape`] unless `0 ≤ depth ≤ 1`, `0 ≤ location ≤ 1`,
/// `width ≥ 0`, `width/2 ≤ location` and `location + width/2 ≤ 1`.
pub fn v_pulse(width: f64, depth: f64, location: f64, sample_num: usize) -> Result<Vec<f64>> {
    let half = width / 2.0;
    if !(0.0..=1.0).contains(&depth) {
        return Err(GaError::InvalidShape(format!("depth {depth} outside [0, 1]")));
    }
    if !(0.0..=1.0).contains(&location) {
        return Err(GaError::InvalidShape(format!("location {location} outside [0, 1]")));
    }
    if width.is_nan() || width < 0.0 || half > location || location + half > 1.0 {
        return Err(GaError::InvalidShape(format!(
            "pulse of width {width} at {location} does not fit in [0, 1]"
        )));
    }

    Ok(sample_pulse(half, depth, location, sample_num))
}

fn sample_pulse(half: f64, depth: f64, location: f64, sample_num: usize) -> Vec<f64> {
    let mut knots = vec![
        (0.0, 0.0),
        (location - half, 0.0),
        (location, -depth),
        (location + half, 0.0),
        (1.0, 0.0),
    ];
    // a pulse touching an edge, or of zero width, shares knots
    knots.dedup_by(|a, b| a.0 == b.0);

    let (xs, ys): (Vec<f64>, Vec<f64>) = knots.into_iter().unzip();
    linear_interpolate(&xs, &ys, &sample_positions(sample_num))
}

/// Scores chromosomes against a fixed V pulse and target frequency.
///
/// `score = 1 / (‖waveform − pulse‖₂ · |freq − target_freq| + ε)`
#[derive(Debug, Clone)]
pub struct VPulseOracle {
    width: f64,
    depth: f64,
    location: f64,
    target_freq: f64,
    sample_num: usize,
    target: Vec<f64>,
}

impl VPulseOracle {
    /// Creates an oracle.
    ///
    /// # Errors
    /// [`GaError::InvalidShape`] for a pulse that does not fit (see
    /// [`v_pulse`]) or a zero `sample_num`.
    pub fn new(
        width: f64,
        depth: f64,
        location: f64,
        target_freq: f64,
        sample_num: usize,
    ) -> Result<Self> {
        if sample_num == 0 {
            return Err(GaError::InvalidShape("sample_num must be positive".into()));
        }
        let target = v_pulse(width, depth, location, sample_num)?;
        Ok(Self {
            width,
            depth,
            location,
            target_freq,
            sample_num,
            target,
        })
    }

    /// Pulse width as a fraction of the waveform duration.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Depth of the dip below the idle level.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Position of the dip's centre on `[0, 1]`.
    pub fn location(&self) -> f64 {
        self.location
    }

    /// Playback frequency the oracle rewards, in Hz.
    pub fn target_freq(&self) -> f64 {
        self.target_freq
    }

    /// Number of samples compared against the target pulse.
    pub fn sample_num(&self) -> usize {
        self.sample_num
    }

    /// The sampled target pulse.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Euclidean distance between the chromosome's waveform and the pulse.
    pub fn distance(&self, chromosome: &Chromosome) -> f64 {
        chromosome
            .waveform(self.sample_num)
            .iter()
            .zip(&self.target)
            .map(|(y, t)| (y - t) * (y - t))
            .sum::<f64>()
            .sqrt()
    }
}

impl Default for VPulseOracle {
    /// 0.6 wide, 0.6 deep pulse at 0.6; 20 MHz target.
    fn default() -> Self {
        let (width, depth, location) = (0.6, 0.6, 0.6);
        Self {
            width,
            depth,
            location,
            target_freq: 20e6,
            sample_num: DEFAULT_SIM_SAMPLES,
            target: sample_pulse(width / 2.0, depth, location, DEFAULT_SIM_SAMPLES),
        }
    }
}

impl FitnessOracle for VPulseOracle {
    fn score(&self, chromosome: &Chromosome) -> f64 {
        let freq_error = (chromosome.freq() - self.target_freq).abs();
        1.0 / (self.distance(chromosome) * freq_error + f64::EPSILON)
    }
}
