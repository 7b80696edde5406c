//! Waveform interpolation and the DAC wire encoding.
//!
//! A chromosome is a sparse set of control points on `(0, 1)`. Before it can
//! be scored or transmitted it is expanded into a dense waveform:
//!
//! 1. Virtual endpoints `(0, 0)` and `(1, 0)` are added so every glitch
//!    starts and ends at the idle level.
//! 2. The points are interpolated over `sample_num` evenly spaced positions
//!    with a shape-preserving C¹ quadratic spline, which stays inside the
//!    range of the control points.
//! 3. For transmission, samples are scaled to the DAC range, clipped, rounded
//!    and written as fixed-width big-endian two's-complement integers.
//!
//! # References
//!
//! - Schumaker (1983), "On Shape Preserving Quadratic Spline Interpolation",
//!   *SIAM J. Numer. Anal.* 20(4)

use crate::error::{GaError, Result};
use crate::ga::Chromosome;

/// Default number of samples in the signal generator memory.
pub const SAMPLE_NUM: usize = 16384;

/// Largest DAC code for the 12-bit reference generator.
pub const MAX_DAC_INT: i32 = 2047;

/// Smallest DAC code for the 12-bit reference generator.
pub const MIN_DAC_INT: i32 = -2047;

// ============================================================================
// Interpolation
// ============================================================================

/// Evenly spaced sample positions `k / (n - 1)` on `[0, 1]`.
pub fn sample_positions(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (n - 1) as f64;
            (0..n).map(|k| k as f64 / last).collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xs, ys)` at ascending positions `at`.
///
/// Positions outside `[xs[0], xs[last]]` are clamped to the end values.
///
/// # Panics
/// Panics if `xs` and `ys` differ in length or are empty.
pub fn linear_interpolate(xs: &[f64], ys: &[f64], at: &[f64]) -> Vec<f64> {
    assert_eq!(xs.len(), ys.len(), "xs and ys must have equal length");
    assert!(!xs.is_empty(), "cannot interpolate zero points");
    debug_assert!(is_strictly_ascending(xs), "interpolation knots must be strictly ascending");

    let n = xs.len();
    let mut seg = 0usize;
    at.iter()
        .map(|&t| {
            if t <= xs[0] {
                return ys[0];
            }
            if t >= xs[n - 1] {
                return ys[n - 1];
            }
            while seg + 1 < n - 1 && t > xs[seg + 1] {
                seg += 1;
            }
            let h = xs[seg + 1] - xs[seg];
            let frac = (t - xs[seg]) / h;
            ys[seg] + frac * (ys[seg + 1] - ys[seg])
        })
        .collect()
}

/// Shape-preserving C¹ quadratic spline through `(xs, ys)`, evaluated at
/// `at`.
///
/// Knot slopes are the harmonic mean of the neighbouring secants, or zero at
/// a local extremum. An end slope is chosen so that the outer interval is a
/// single parabola whenever that keeps the sign of its secant. Each interval
/// is then covered by one or two quadratic pieces that match the knot values
/// and slopes at both ends.
///
/// The spline is monotone between consecutive knots, so it never leaves
/// `[min(ys), max(ys)]`, however close two knots are.
///
/// Falls back to [`linear_interpolate`] with fewer than three knots.
///
/// # Complexity
/// O(n + m log n) for n knots and m sample positions.
///
/// # References
///
/// - Schumaker (1983), "On Shape Preserving Quadratic Spline Interpolation",
///   *SIAM J. Numer. Anal.* 20(4)
///
/// # Panics
/// Panics if `xs` and `ys` differ in length or are empty.
pub fn quadratic_interpolate(xs: &[f64], ys: &[f64], at: &[f64]) -> Vec<f64> {
    assert_eq!(xs.len(), ys.len(), "xs and ys must have equal length");
    assert!(!xs.is_empty(), "cannot interpolate zero points");
    debug_assert!(is_strictly_ascending(xs), "interpolation knots must be strictly ascending");

    let n = xs.len();
    if n < 3 {
        return linear_interpolate(xs, ys, at);
    }

    let slopes = knot_slopes(xs, ys);
    let mut pieces = Vec::with_capacity(2 * (n - 1));
    for i in 0..n - 1 {
        push_interval(
            &mut pieces,
            (xs[i], ys[i], slopes[i]),
            (xs[i + 1], ys[i + 1], slopes[i + 1]),
        );
    }

    at.iter()
        .map(|&t| {
            let t = t.clamp(xs[0], xs[n - 1]);
            let k = pieces.partition_point(|p| p.start <= t).saturating_sub(1);
            pieces[k].eval(t)
        })
        .collect()
}

/// One quadratic piece `value + slope·dt + curvature·dt²`, `dt = t - start`.
#[derive(Debug, Clone, Copy)]
struct QuadPiece {
    start: f64,
    value: f64,
    slope: f64,
    curvature: f64,
}

impl QuadPiece {
    fn eval(&self, t: f64) -> f64 {
        let dt = t - self.start;
        self.value + self.slope * dt + self.curvature * dt * dt
    }
}

/// Co-monotone knot slopes.
fn knot_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let secants: Vec<f64> = (0..n - 1)
        .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
        .collect();

    let mut slopes = vec![0.0; n];
    for i in 1..n - 1 {
        let (a, b) = (secants[i - 1], secants[i]);
        if a * b > 0.0 {
            slopes[i] = 2.0 * a * b / (a + b);
        }
    }

    let end_slope = |secant: f64, inner: f64| {
        let s = 2.0 * secant - inner;
        if s * secant > 0.0 {
            s
        } else {
            0.0
        }
    };
    slopes[0] = end_slope(secants[0], slopes[1]);
    slopes[n - 1] = end_slope(secants[n - 2], slopes[n - 2]);
    slopes
}

/// Covers `[left.0, right.0]` with one or two pieces matching the value and
/// slope at both ends. Each knot is `(x, y, slope)`.
fn push_interval(pieces: &mut Vec<QuadPiece>, left: (f64, f64, f64), right: (f64, f64, f64)) {
    let (t1, z1, s1) = left;
    let (t2, z2, s2) = right;
    let h = t2 - t1;
    let secant = (z2 - z1) / h;

    if (s1 + s2 - 2.0 * secant).abs() <= 1e-12 * secant.abs().max(1.0) {
        pieces.push(QuadPiece {
            start: t1,
            value: z1,
            slope: s1,
            curvature: (s2 - s1) / (2.0 * h),
        });
        return;
    }

    // inner knot: the midpoint when both end slopes sit on the same side of
    // the secant, otherwise the point that keeps the piece monotone
    let xi = if (s1 - secant) * (s2 - secant) >= 0.0 {
        (t1 + t2) / 2.0
    } else if (s2 - secant).abs() < (s1 - secant).abs() {
        t1 + h * (s2 - secant) / (s2 - s1)
    } else {
        t2 + h * (s1 - secant) / (s2 - s1)
    };
    let alpha = xi - t1;
    let beta = t2 - xi;
    let mid_slope = (2.0 * (z2 - z1) - (alpha * s1 + beta * s2)) / h;
    let mid_value = z1 + (s1 + mid_slope) * alpha / 2.0;

    if alpha > 0.0 {
        pieces.push(QuadPiece {
            start: t1,
            value: z1,
            slope: s1,
            curvature: (mid_slope - s1) / (2.0 * alpha),
        });
    }
    if beta > 0.0 {
        pieces.push(QuadPiece {
            start: xi,
            value: mid_value,
            slope: mid_slope,
            curvature: (s2 - mid_slope) / (2.0 * beta),
        });
    }
}

fn is_strictly_ascending(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[0] < w[1])
}

// ============================================================================
// Encoding
// ============================================================================

/// Converts chromosomes into the byte stream consumed by the signal
/// generator.
///
/// # Examples
///
/// ```
/// use glitch_ga::waveform::WaveformEncoder;
///
/// let encoder = WaveformEncoder::default();
/// let bytes = encoder.encode_samples(&[1, -1, 2047]).unwrap();
/// assert_eq!(bytes, vec![0x00, 0x01, 0xFF, 0xFF, 0x07, 0xFF]);
/// assert_eq!(encoder.decode(&bytes).unwrap(), vec![1, -1, 2047]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaveformEncoder {
    /// Number of samples in the generated waveform.
    pub sample_num: usize,

    /// DAC code corresponding to a normalized amplitude of `+1.0`.
    pub max_dac_int: i32,

    /// Lowest DAC code the generator accepts.
    pub min_dac_int: i32,

    /// Width of one encoded sample in bytes (2 for the reference encoding).
    pub sample_bytes: usize,
}

impl Default for WaveformEncoder {
    fn default() -> Self {
        Self {
            sample_num: SAMPLE_NUM,
            max_dac_int: MAX_DAC_INT,
            min_dac_int: MIN_DAC_INT,
            sample_bytes: 2,
        }
    }
}

impl WaveformEncoder {
    /// Creates an encoder, checking that the DAC range fits the sample width.
    pub fn new(
        sample_num: usize,
        max_dac_int: i32,
        min_dac_int: i32,
        sample_bytes: usize,
    ) -> Result<Self> {
        let encoder = Self {
            sample_num,
            max_dac_int,
            min_dac_int,
            sample_bytes,
        };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Validates the encoder parameters.
    pub fn validate(&self) -> Result<()> {
        if self.sample_num < 2 {
            return Err(GaError::InvalidEncoding(
                "sample_num must be at least 2".into(),
            ));
        }
        if !(1..=4).contains(&self.sample_bytes) {
            return Err(GaError::InvalidEncoding(
                "sample_bytes must be between 1 and 4".into(),
            ));
        }
        if self.min_dac_int > self.max_dac_int {
            return Err(GaError::InvalidEncoding(
                "min_dac_int must not exceed max_dac_int".into(),
            ));
        }
        let bits = (self.sample_bytes * 8) as u32;
        let hi = (1i64 << (bits - 1)) - 1;
        let lo = -(1i64 << (bits - 1));
        if i64::from(self.max_dac_int) > hi || i64::from(self.min_dac_int) < lo {
            return Err(GaError::InvalidEncoding(format!(
                "DAC range [{}, {}] does not fit in {} bits",
                self.min_dac_int, self.max_dac_int, bits
            )));
        }
        Ok(())
    }

    /// Scales, clips and rounds normalized samples to DAC codes.
    ///
    /// Rounding is half-to-even.
    pub fn quantize_samples(&self, samples: &[f64]) -> Vec<i32> {
        let max = f64::from(self.max_dac_int);
        let min = f64::from(self.min_dac_int);
        samples
            .iter()
            .map(|&s| (s * max).clamp(min, max).round_ties_even() as i32)
            .collect()
    }

    /// Interpolates a chromosome and quantizes it to DAC codes.
    pub fn quantize(&self, chromosome: &Chromosome) -> Vec<i32> {
        self.quantize_samples(&chromosome.waveform(self.sample_num))
    }

    /// Encodes DAC codes as concatenated big-endian two's-complement words.
    ///
    /// # Errors
    /// Returns [`GaError::InvalidEncoding`] if the encoder parameters fail
    /// [`validate`](Self::validate), e.g. a sample width outside `1..=4`.
    pub fn encode_samples(&self, codes: &[i32]) -> Result<Vec<u8>> {
        self.validate()?;
        let width = self.sample_bytes;
        let mut out = Vec::with_capacity(codes.len() * width);
        for &code in codes {
            let be = code.to_be_bytes();
            out.extend_from_slice(&be[be.len() - width..]);
        }
        Ok(out)
    }

    /// Produces the full byte stream for a chromosome.
    pub fn encode(&self, chromosome: &Chromosome) -> Result<Vec<u8>> {
        self.validate()?;
        self.encode_samples(&self.quantize(chromosome))
    }

    /// Decodes a byte stream back into DAC codes, sign-extending each word.
    ///
    /// # Errors
    /// Returns [`GaError::InvalidEncoding`] for invalid encoder parameters or
    /// a stream that is not a whole number of samples.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<i32>> {
        self.validate()?;
        let width = self.sample_bytes;
        if bytes.len() % width != 0 {
            return Err(GaError::InvalidEncoding(format!(
                "{} bytes is not a multiple of the {}-byte sample width",
                bytes.len(),
                width
            )));
        }
        let shift = 32 - (width as u32) * 8;
        Ok(bytes
            .chunks_exact(width)
            .map(|chunk| {
                let raw = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                ((raw << shift) as i32) >> shift
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_positions_span_unit_interval() {
        let p = sample_positions(5);
        assert_eq!(p, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(sample_positions(0).is_empty());
    }

    #[test]
    fn test_linear_interpolate_midpoints() {
        let xs = [0.0, 0.5, 1.0];
        let ys = [0.0, -1.0, 0.0];
        let out = linear_interpolate(&xs, &ys, &[0.0, 0.25, 0.5, 0.75, 1.0]);
        let expected = [0.0, -0.5, -1.0, -0.5, 0.0];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12, "got {out:?}");
        }
    }

    #[test]
    fn test_quadratic_passes_through_knots() {
        let xs = [0.0, 0.2, 0.45, 0.7, 1.0];
        let ys = [0.0, 0.8, -0.3, 0.5, 0.0];
        let out = quadratic_interpolate(&xs, &ys, &xs);
        for (a, b) in out.iter().zip(ys.iter()) {
            assert!((a - b).abs() < 1e-9, "spline missed a knot: {out:?}");
        }
    }

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len());
        for (a, b) in got.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9, "got {got:?}, expected {expected:?}");
        }
    }

    #[test]
    fn test_quadratic_reference_values() {
        assert_close(
            &quadratic_interpolate(&[0.0, 0.5, 1.0], &[0.0, 1.0, 0.0], &[0.25, 0.5, 0.75]),
            &[0.75, 1.0, 0.75],
        );
        assert_close(
            &quadratic_interpolate(
                &[0.0, 0.2, 0.45, 0.7, 1.0],
                &[0.0, 0.8, -0.3, 0.5, 0.0],
                &[0.1, 0.3, 0.6, 0.85],
            ),
            &[0.6, 0.448, 0.244, 0.375],
        );
        assert_close(
            &quadratic_interpolate(&[0.0, 0.25, 0.5, 1.0], &[0.0, 0.5, 1.0, 0.0], &sample_positions(5)),
            &[0.0, 0.5, 1.0, 0.75, 0.0],
        );
    }

    #[test]
    fn test_quadratic_reproduces_line() {
        let xs = [0.0, 0.1, 0.35, 0.8, 1.0];
        let ys: Vec<f64> = xs.iter().map(|&x| 0.5 - x).collect();
        let at = sample_positions(21);
        let expected: Vec<f64> = at.iter().map(|&x| 0.5 - x).collect();
        assert_close(&quadratic_interpolate(&xs, &ys, &at), &expected);
    }

    #[test]
    fn test_quadratic_is_continuously_differentiable() {
        let xs = [0.0, 0.2, 0.45, 0.7, 1.0];
        let ys = [0.0, 0.8, -0.3, 0.5, 0.0];
        let h = 1e-7;
        for &x in &xs[1..xs.len() - 1] {
            let v = quadratic_interpolate(&xs, &ys, &[x - h, x, x + h]);
            let left = (v[1] - v[0]) / h;
            let right = (v[2] - v[1]) / h;
            assert!((left - right).abs() < 1e-4, "slope jump at {x}: {left} vs {right}");
        }
    }

    #[test]
    fn test_quadratic_stays_within_knot_range_for_close_knots() {
        // two nearly coincident knots with opposite values
        let xs = [0.0, 0.3, 0.3 + 1e-9, 0.6, 1.0];
        let ys = [0.0, -1.0, 1.0, -0.4, 0.0];
        let out = quadratic_interpolate(&xs, &ys, &sample_positions(4096));
        let worst = out.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(worst <= 1.0 + 1e-12, "spline overshoots to {worst}");
    }

    #[test]
    fn test_waveform_bounded_for_random_chromosomes() {
        let mut rng = crate::random::create_rng(42);
        for length in 4..=32 {
            for _ in 0..20 {
                let c = Chromosome::random(length, 1e6, 25e6, &mut rng);
                let worst = c.waveform(2048).iter().fold(0.0f64, |m, v| m.max(v.abs()));
                assert!(worst <= 1.0 + 1e-12, "|waveform| reached {worst} for {c}");
            }
        }
    }

    #[test]
    fn test_quadratic_two_points_is_linear() {
        let out = quadratic_interpolate(&[0.0, 1.0], &[0.0, 1.0], &[0.5]);
        assert!((out[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_quantize_clips_and_rounds() {
        let enc = WaveformEncoder::default();
        let codes = enc.quantize_samples(&[0.0, 1.0, -1.0, 1.5, -3.0, 0.5]);
        assert_eq!(codes, vec![0, 2047, -2047, 2047, -2047, 1024]);
    }

    #[test]
    fn test_encode_big_endian_twos_complement() {
        let enc = WaveformEncoder::default();
        assert_eq!(enc.encode_samples(&[-2047]).unwrap(), vec![0xF8, 0x01]);
        assert_eq!(enc.encode_samples(&[256]).unwrap(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        let enc = WaveformEncoder::default();
        assert!(matches!(enc.decode(&[0x00, 0x01, 0x02]), Err(GaError::InvalidEncoding(_))));
    }

    #[test]
    fn test_one_byte_encoding_round_trip() {
        let enc = WaveformEncoder::new(16, 127, -128, 1).unwrap();
        let codes = vec![-128, -1, 0, 1, 127];
        assert_eq!(enc.decode(&enc.encode_samples(&codes).unwrap()).unwrap(), codes);
    }

    #[test]
    fn test_invalid_sample_width_is_an_error() {
        for sample_bytes in [0, 5, 8] {
            let enc = WaveformEncoder {
                sample_bytes,
                ..WaveformEncoder::default()
            };
            assert!(matches!(enc.encode_samples(&[1, -1]), Err(GaError::InvalidEncoding(_))));
            assert!(matches!(
                enc.decode(&[0u8; 40]),
                Err(GaError::InvalidEncoding(_))
            ));
            let mut rng = crate::random::create_rng(42);
            let c = Chromosome::random(5, 1e6, 25e6, &mut rng);
            assert!(enc.encode(&c).is_err());
        }
    }

    #[test]
    fn test_new_rejects_range_wider_than_width() {
        assert!(WaveformEncoder::new(16, 300, -300, 1).is_err());
        assert!(WaveformEncoder::new(16, 10, 20, 2).is_err());
        assert!(WaveformEncoder::new(1, 10, -10, 2).is_err());
    }
}
