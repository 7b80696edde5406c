//! The waveform chromosome and its structural operations.
//!
//! A [`Chromosome`] is a sorted list of `(x, y)` control points on the open
//! interval `(0, 1)` plus an oscillation frequency. Two notions of equality
//! are kept apart:
//!
//! - **identity** ([`same_identity`](Chromosome::same_identity)): the opaque
//!   [`Uuid`] token, renewed whenever the genome content changes;
//! - **content** ([`same_shape`](Chromosome::same_shape)): exact equality of
//!   the coordinate lists.
//!
//! `Chromosome` intentionally does not implement `PartialEq`.

#[cfg(feature = "serde")]
use crate::error::GaError;
use crate::random::random_uuid;
use crate::waveform::{quadratic_interpolate, sample_positions};
use rand::Rng;
use rand_distr::{Distribution, Triangular};
use std::fmt;
use uuid::Uuid;

/// Smallest admissible x. Keeps control points off the virtual `(0, 0)` knot.
pub const X_MIN: f64 = f64::EPSILON;

/// Largest admissible x. Keeps control points off the virtual `(1, 0)` knot.
pub const X_MAX: f64 = 1.0 - f64::EPSILON;

/// Minimum number of control points a configured chromosome may start with.
pub const MIN_CHROMOSOME_LENGTH: usize = 4;

/// How duplicate-x collisions are resolved during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DuplicateRepair {
    /// Replace every dropped point with a fresh random point (length kept).
    #[default]
    Replace,

    /// Drop colliding points; refill only up to the minimum length.
    Drop,
}

/// One candidate glitch: control points and a frequency.
///
/// With the `serde` feature, deserialization rejects data that is not
/// [well formed](Chromosome::is_well_formed) or whose frequency is not a
/// positive finite number.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ChromosomeData"))]
pub struct Chromosome {
    id: Uuid,
    coordinates: Vec<(f64, f64)>,
    freq: f64,
}

/// Unchecked wire form of a [`Chromosome`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ChromosomeData {
    id: Uuid,
    coordinates: Vec<(f64, f64)>,
    freq: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<ChromosomeData> for Chromosome {
    type Error = GaError;

    fn try_from(data: ChromosomeData) -> Result<Self, Self::Error> {
        if !(data.freq.is_finite() && data.freq > 0.0) {
            return Err(GaError::InvalidChromosome(format!(
                "frequency {} is not a positive finite number",
                data.freq
            )));
        }
        let chromosome = Self {
            id: data.id,
            coordinates: data.coordinates,
            freq: data.freq,
        };
        if !chromosome.is_well_formed() {
            return Err(GaError::InvalidChromosome(format!(
                "control points must be strictly ascending in x on ({X_MIN}, {X_MAX}) with y in [-1, 1]: {chromosome}"
            )));
        }
        Ok(chromosome)
    }
}

impl Chromosome {
    /// Builds a chromosome from raw points.
    ///
    /// Points are clamped into range, sorted, and duplicate x values are
    /// replaced with fresh random points so the result is well formed.
    pub fn from_points<R: Rng + ?Sized>(points: Vec<(f64, f64)>, freq: f64, rng: &mut R) -> Self {
        let mut chromosome = Self {
            id: random_uuid(rng),
            coordinates: points,
            freq,
        };
        chromosome.repair(DuplicateRepair::Replace, 1, rng);
        chromosome
    }

    /// Creates a random chromosome with `length` control points.
    ///
    /// x values are uniform on `(0, 1)` and unique, y values uniform on
    /// `[-1, 1]`. The frequency follows a triangular distribution over
    /// `[min_freq, max_freq]` whose mode is `max_freq`.
    pub fn random<R: Rng + ?Sized>(length: usize, min_freq: f64, max_freq: f64, rng: &mut R) -> Self {
        let mut chromosome = Self {
            id: random_uuid(rng),
            coordinates: Vec::with_capacity(length),
            freq: triangular_freq(min_freq, max_freq, rng),
        };
        for _ in 0..length {
            let x = chromosome.fresh_x(rng);
            let y = rng.random_range(-1.0..=1.0);
            chromosome.coordinates.push((x, y));
        }
        chromosome.sort();
        chromosome
    }

    /// Identity token.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Control points, ascending by x.
    pub fn coordinates(&self) -> &[(f64, f64)] {
        &self.coordinates
    }

    pub(crate) fn coordinates_mut(&mut self) -> &mut Vec<(f64, f64)> {
        &mut self.coordinates
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Whether the chromosome has no control points.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Oscillation frequency.
    pub fn freq(&self) -> f64 {
        self.freq
    }

    pub(crate) fn set_freq(&mut self, freq: f64) {
        self.freq = freq;
    }

    /// Marks the chromosome as content-changed by drawing a new token.
    pub fn renew_id<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.id = random_uuid(rng);
    }

    /// Deep copy with a fresh identity.
    pub fn clone_with_new_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut copy = self.clone();
        copy.renew_id(rng);
        copy
    }

    /// Identity comparison: same token, regardless of content.
    pub fn same_identity(&self, other: &Chromosome) -> bool {
        self.id == other.id
    }

    /// Content comparison: same length and coordinate-wise equal points.
    pub fn same_shape(&self, other: &Chromosome) -> bool {
        self.coordinates == other.coordinates
    }

    /// Sorts control points by x ascending.
    pub fn sort(&mut self) {
        self.coordinates.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    /// Whether two control points share an x value.
    pub fn has_duplicate_x(&self) -> bool {
        let mut xs: Vec<f64> = self.coordinates.iter().map(|p| p.0).collect();
        xs.sort_by(f64::total_cmp);
        xs.windows(2).any(|w| w[0] == w[1])
    }

    /// Checks every representation invariant: x strictly ascending inside
    /// `(0, 1)` and y inside `[-1, 1]`.
    pub fn is_well_formed(&self) -> bool {
        self.coordinates
            .iter()
            .all(|&(x, y)| (X_MIN..=X_MAX).contains(&x) && (-1.0..=1.0).contains(&y))
            && self.coordinates.windows(2).all(|w| w[0].0 < w[1].0)
    }

    /// Clamps y values into `[-1, 1]`.
    pub fn clamp_amplitudes(&mut self) {
        for p in &mut self.coordinates {
            p.1 = p.1.clamp(-1.0, 1.0);
        }
    }

    /// Restores the representation invariants.
    ///
    /// Clamps points into range, sorts by x, and resolves duplicate x per
    /// `policy`. Under [`DuplicateRepair::Replace`] the length is preserved;
    /// under [`DuplicateRepair::Drop`] the chromosome may shrink, but never
    /// below `min_length`.
    ///
    /// Returns `true` if the coordinates changed.
    pub fn repair<R: Rng + ?Sized>(
        &mut self,
        policy: DuplicateRepair,
        min_length: usize,
        rng: &mut R,
    ) -> bool {
        let before = self.coordinates.clone();
        let original_len = before.len();

        for p in &mut self.coordinates {
            p.0 = if p.0.is_nan() { X_MIN } else { p.0.clamp(X_MIN, X_MAX) };
            p.1 = if p.1.is_nan() { 0.0 } else { p.1.clamp(-1.0, 1.0) };
        }
        self.sort();
        self.coordinates.dedup_by(|later, kept| later.0 == kept.0);

        let target = match policy {
            DuplicateRepair::Replace => original_len,
            DuplicateRepair::Drop => min_length,
        };
        while self.coordinates.len() < target {
            self.add_random_point(rng);
        }

        self.coordinates != before
    }

    /// Inserts a random point with an x not already present.
    pub fn add_random_point<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let x = self.fresh_x(rng);
        let y = rng.random_range(-1.0..=1.0);
        let pos = self.coordinates.partition_point(|p| p.0 < x);
        self.coordinates.insert(pos, (x, y));
    }

    /// Removes a random point unless that would leave fewer than
    /// `min_length` points. Returns whether a point was removed.
    pub fn remove_random_point<R: Rng + ?Sized>(&mut self, min_length: usize, rng: &mut R) -> bool {
        if self.coordinates.len() <= min_length.max(1) {
            return false;
        }
        let idx = rng.random_range(0..self.coordinates.len());
        self.coordinates.remove(idx);
        true
    }

    /// Knots of the interpolated waveform including the virtual endpoints.
    pub fn knots(&self) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::with_capacity(self.coordinates.len() + 2);
        let mut ys = Vec::with_capacity(self.coordinates.len() + 2);
        xs.push(0.0);
        ys.push(0.0);
        for &(x, y) in &self.coordinates {
            xs.push(x);
            ys.push(y);
        }
        xs.push(1.0);
        ys.push(0.0);
        (xs, ys)
    }

    /// Continuous waveform sampled at `sample_num` evenly spaced points.
    pub fn waveform(&self, sample_num: usize) -> Vec<f64> {
        let (xs, ys) = self.knots();
        quadratic_interpolate(&xs, &ys, &sample_positions(sample_num))
    }

    /// Draws an x in `(0, 1)` not used by any current point.
    fn fresh_x<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let x = rng.random_range(X_MIN..X_MAX);
            if !self.coordinates.iter().any(|p| p.0 == x) {
                return x;
            }
        }
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "freq={:.0}Hz points=[", self.freq)?;
        for (i, (x, y)) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({x:.4}, {y:.4})")?;
        }
        write!(f, "]")
    }
}

/// Triangular draw over `[min, max]` biased toward `max`.
pub(crate) fn triangular_freq<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> f64 {
    match Triangular::new(min, max, max) {
        Ok(dist) => dist.sample(rng),
        Err(_) => max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn fixed(points: &[(f64, f64)]) -> Chromosome {
        let mut rng = create_rng(0);
        Chromosome {
            id: random_uuid(&mut rng),
            coordinates: points.to_vec(),
            freq: 10e6,
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_malformed_data() {
        let valid = fixed(&[(0.2, 0.5), (0.6, -0.5)]);
        let json = serde_json::to_string(&valid).unwrap();
        let back: Chromosome = serde_json::from_str(&json).unwrap();
        assert!(back.same_identity(&valid) && back.same_shape(&valid));

        let id = valid.id();
        for (coordinates, freq) in [
            ("[[0.6, 0.1], [0.2, 0.1]]", "1e6"),
            ("[[0.3, 0.1], [0.3, 0.2]]", "1e6"),
            ("[[0.0, 0.1], [0.5, 0.2]]", "1e6"),
            ("[[0.2, 1.5], [0.5, 0.2]]", "1e6"),
            ("[[0.2, 0.1], [0.5, 0.2]]", "-5.0"),
        ] {
            let json = format!(r#"{{"id":"{id}","coordinates":{coordinates},"freq":{freq}}}"#);
            assert!(
                serde_json::from_str::<Chromosome>(&json).is_err(),
                "accepted malformed chromosome {json}"
            );
        }
    }

    #[test]
    fn test_random_is_well_formed() {
        let mut rng = create_rng(42);
        for len in [1, 4, 9, 32] {
            let c = Chromosome::random(len, 1e6, 25e6, &mut rng);
            assert_eq!(c.len(), len);
            assert!(c.is_well_formed(), "random chromosome malformed: {c}");
            assert!((1e6..=25e6).contains(&c.freq()));
        }
    }

    #[test]
    fn test_triangular_freq_biased_high() {
        let mut rng = create_rng(42);
        let n = 4000;
        let above = (0..n)
            .filter(|_| triangular_freq(0.0, 1.0, &mut rng) > 0.5)
            .count();
        // P(x > 0.5) = 0.75 for mode = max
        assert!(above > n * 2 / 3, "expected bias toward max, got {above}/{n}");
    }

    #[test]
    fn test_clone_with_new_id_keeps_content() {
        let mut rng = create_rng(1);
        let a = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let b = a.clone_with_new_id(&mut rng);
        assert!(a.same_shape(&b));
        assert!(!a.same_identity(&b));
        assert_eq!(a.freq(), b.freq());
    }

    #[test]
    fn test_repair_replace_keeps_length() {
        let mut rng = create_rng(3);
        let mut c = fixed(&[(0.5, 0.1), (0.2, 0.3), (0.5, -0.4), (0.9, 2.0)]);
        assert!(c.has_duplicate_x());
        let changed = c.repair(DuplicateRepair::Replace, 2, &mut rng);
        assert!(changed);
        assert_eq!(c.len(), 4);
        assert!(c.is_well_formed(), "repaired chromosome malformed: {c}");
        assert!(!c.has_duplicate_x());
    }

    #[test]
    fn test_repair_drop_shrinks_to_minimum() {
        let mut rng = create_rng(3);
        let mut c = fixed(&[(0.5, 0.1), (0.5, 0.2), (0.5, 0.3), (0.7, 0.0)]);
        c.repair(DuplicateRepair::Drop, 3, &mut rng);
        assert_eq!(c.len(), 3);
        assert!(c.is_well_formed());

        let mut d = fixed(&[(0.1, 0.1), (0.1, 0.2), (0.4, 0.3), (0.7, 0.0)]);
        d.repair(DuplicateRepair::Drop, 1, &mut rng);
        assert_eq!(d.len(), 3, "drop policy should not refill above minimum");
    }

    #[test]
    fn test_repair_clamps_endpoints_and_amplitudes() {
        let mut rng = create_rng(5);
        let mut c = fixed(&[(0.0, -3.0), (1.0, 3.0), (0.5, 0.0)]);
        c.repair(DuplicateRepair::Replace, 1, &mut rng);
        assert!(c.is_well_formed(), "{c}");
        assert_eq!(c.coordinates()[0], (X_MIN, -1.0));
        assert_eq!(c.coordinates()[2], (X_MAX, 1.0));
    }

    #[test]
    fn test_repair_well_formed_is_noop() {
        let mut rng = create_rng(5);
        let mut c = Chromosome::random(6, 1e6, 25e6, &mut rng);
        let before = c.clone();
        assert!(!c.repair(DuplicateRepair::Replace, 4, &mut rng));
        assert!(c.same_shape(&before));
    }

    #[test]
    fn test_remove_respects_minimum() {
        let mut rng = create_rng(9);
        let mut c = Chromosome::random(4, 1e6, 25e6, &mut rng);
        assert!(!c.remove_random_point(4, &mut rng));
        assert_eq!(c.len(), 4);
        assert!(c.remove_random_point(3, &mut rng));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_add_point_keeps_order() {
        let mut rng = create_rng(11);
        let mut c = Chromosome::random(4, 1e6, 25e6, &mut rng);
        for _ in 0..20 {
            c.add_random_point(&mut rng);
        }
        assert_eq!(c.len(), 24);
        assert!(c.is_well_formed());
    }

    #[test]
    fn test_waveform_anchored_at_zero() {
        let mut rng = create_rng(13);
        let c = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let w = c.waveform(64);
        assert_eq!(w.len(), 64);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[63], 0.0);
    }

    #[test]
    fn test_knots_include_virtual_endpoints() {
        let c = fixed(&[(0.25, 0.5), (0.75, -0.5)]);
        let (xs, ys) = c.knots();
        assert_eq!(xs, vec![0.0, 0.25, 0.75, 1.0]);
        assert_eq!(ys, vec![0.0, 0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_display_lists_points() {
        let c = fixed(&[(0.25, 0.5)]);
        assert_eq!(c.to_string(), "freq=10000000Hz points=[(0.2500, 0.5000)]");
    }
}
