//! Waveform crossover and mutation operators.
//!
//! Operators are stateless: everything they need comes from [`GaConfig`]
//! and the caller's RNG. Each operator returns chromosomes that satisfy the
//! representation invariants (sorted unique x on `(0, 1)`, y on `[-1, 1]`).
//!
//! # Crossover
//!
//! - [`uniform_waveform_crossover`]: locus-wise uniform exchange between
//!   parents of unequal length, plus a convex blend of the frequencies.
//!
//! # Mutation
//!
//! - [`mutate`]: composite of independent sub-mutations (point jitter,
//!   adjacent swap, structural add/remove, frequency jitter, macro crossover).
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Michalewicz (1996), *Genetic Algorithms + Data Structures = Evolution
//!   Programs*, ch. 6 (arithmetic crossover on real parameters)

use super::chromosome::Chromosome;
use super::config::{GaConfig, NoiseKind};
use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

// ============================================================================
// Crossover
// ============================================================================

/// Uniform crossover for variable-length waveform chromosomes.
///
/// `child1` keeps the structure (and length) of `parent1`, `child2` that of
/// `parent2`.
///
/// # Algorithm
///
/// 1. Order the parents by length, shorter first, and copy each into a child
/// 2. Draw `shorter_len` distinct indices from the longer parent, ascending
/// 3. For each locus of the shorter child, with probability 0.5 swap it with
///    the longer child's matching drawn index
/// 4. Re-sort both children and repair duplicate x values
/// 5. Blend frequencies with one weight `w`: `c1 = w·p1 + (1-w)·p2`,
///    `c2 = w·p2 + (1-w)·p1`
///
/// # Complexity
/// O(n log n) in the longer parent's length
pub fn uniform_waveform_crossover<R: Rng + ?Sized>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    config: &GaConfig,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let w = rng.random_range(0.0..=1.0);
    crossover_with_weight(parent1, parent2, w, config, rng)
}

/// [`uniform_waveform_crossover`] with a caller-supplied blend weight.
///
/// `w` is clamped to `[0, 1]`.
pub fn crossover_with_weight<R: Rng + ?Sized>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    w: f64,
    config: &GaConfig,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let w = w.clamp(0.0, 1.0);
    let mut child1 = parent1.clone_with_new_id(rng);
    let mut child2 = parent2.clone_with_new_id(rng);

    {
        let (short, long) = if child1.len() <= child2.len() {
            (&mut child1, &mut child2)
        } else {
            (&mut child2, &mut child1)
        };
        exchange_loci(short, long, config.crossover_guard_duplicates, rng);
    }

    for child in [&mut child1, &mut child2] {
        child.sort();
        child.repair(config.duplicate_repair, config.min_chromosome_length, rng);
    }

    child1.set_freq(w * parent1.freq() + (1.0 - w) * parent2.freq());
    child2.set_freq(w * parent2.freq() + (1.0 - w) * parent1.freq());

    (child1, child2)
}

/// Swaps loci between the shorter and the longer child in place.
fn exchange_loci<R: Rng + ?Sized>(
    short: &mut Chromosome,
    long: &mut Chromosome,
    guard_duplicates: bool,
    rng: &mut R,
) {
    let short_len = short.len();
    let long_len = long.len();
    if short_len == 0 {
        return;
    }

    let mut picks = index::sample(rng, long_len, short_len).into_vec();
    picks.sort_unstable();

    let short_pts = short.coordinates_mut();
    let long_pts = long.coordinates_mut();
    for (i, &j) in picks.iter().enumerate() {
        if !rng.random_bool(0.5) {
            continue;
        }
        if guard_duplicates {
            let incoming_short = long_pts[j].0;
            let incoming_long = short_pts[i].0;
            let collides_short = short_pts
                .iter()
                .enumerate()
                .any(|(k, p)| k != i && p.0 == incoming_short);
            let collides_long = long_pts
                .iter()
                .enumerate()
                .any(|(k, p)| k != j && p.0 == incoming_long);
            if collides_short || collides_long {
                continue;
            }
        }
        std::mem::swap(&mut short_pts[i], &mut long_pts[j]);
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Composite mutation.
///
/// Each sub-mutation fires independently with its own probability from
/// `config`:
///
/// | sub-mutation | probability | effect |
/// |---|---|---|
/// | point jitter | `mutation_prob` | one y += noise · `mutation_size` |
/// | swap | `swap_prob` | swap the y of two adjacent points |
/// | structural | `structural_prob` | remove (above the minimum) or add a point |
/// | frequency | `freq_mutation_prob` | freq += noise · `freq_mutation_size` |
/// | macro crossover | `macro_crossover_prob` | cross with a fresh random chromosome |
///
/// The identity token is renewed on **every** call, even when no
/// sub-mutation fired. Duplicate detection keys on content, so this only
/// affects provenance tracking.
pub fn mutate<R: Rng + ?Sized>(chromosome: &mut Chromosome, config: &GaConfig, rng: &mut R) {
    if rng.random_bool(config.mutation_prob) {
        point_jitter(chromosome, config, rng);
    }
    if rng.random_bool(config.swap_prob) {
        adjacent_swap(chromosome, rng);
    }
    if rng.random_bool(config.structural_prob) {
        if rng.random_bool(0.5) {
            chromosome.remove_random_point(config.min_chromosome_length, rng);
        } else {
            chromosome.add_random_point(rng);
        }
    }
    if rng.random_bool(config.freq_mutation_prob) {
        let freq = chromosome.freq() + noise(config.noise, rng) * config.freq_mutation_size;
        chromosome.set_freq(freq.clamp(config.min_freq, config.max_freq));
    }
    if rng.random_bool(config.macro_crossover_prob) {
        *chromosome = macro_crossover(chromosome, config, rng);
    }

    chromosome.clamp_amplitudes();
    chromosome.renew_id(rng);
}

/// Adds noise to the y value of one random point.
pub fn point_jitter<R: Rng + ?Sized>(chromosome: &mut Chromosome, config: &GaConfig, rng: &mut R) {
    if chromosome.is_empty() {
        return;
    }
    let idx = rng.random_range(0..chromosome.len());
    let delta = noise(config.noise, rng) * config.mutation_size;
    chromosome.coordinates_mut()[idx].1 += delta;
}

/// Swaps the y values of two adjacent points. No-op below two points.
pub fn adjacent_swap<R: Rng + ?Sized>(chromosome: &mut Chromosome, rng: &mut R) {
    let n = chromosome.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n - 1);
    let pts = chromosome.coordinates_mut();
    let y = pts[i].1;
    pts[i].1 = pts[i + 1].1;
    pts[i + 1].1 = y;
}

/// Recombines with a fresh random chromosome and keeps one child at random.
fn macro_crossover<R: Rng + ?Sized>(chromosome: &Chromosome, config: &GaConfig, rng: &mut R) -> Chromosome {
    let partner = Chromosome::random(config.chromosome_length, config.min_freq, config.max_freq, rng);
    let (c1, c2) = uniform_waveform_crossover(chromosome, &partner, config, rng);
    if rng.random_bool(0.5) {
        c1
    } else {
        c2
    }
}

/// Zero-mean unit-scale noise.
pub fn noise<R: Rng + ?Sized>(kind: NoiseKind, rng: &mut R) -> f64 {
    match kind {
        NoiseKind::Gaussian => StandardNormal.sample(rng),
        NoiseKind::Uniform => rng.random_range(-1.0..=1.0),
    }
}

// ============================================================================
// Tests
// ============================================================================
