//! Pre-generation repair and duplicate breaking.
//!
//! Runs before selection so that every operator sees well-formed genomes
//! and the population cannot collapse onto a single genotype.

use super::chromosome::Chromosome;
use super::config::GaConfig;
use super::operators::noise;
use rand::Rng;

/// Repairs every chromosome in place.
///
/// Returns the positions whose coordinates changed, so cached scores for
/// them can be invalidated.
pub fn repair_population<R: Rng + ?Sized>(
    population: &mut [Chromosome],
    config: &GaConfig,
    rng: &mut R,
) -> Vec<usize> {
    let mut changed = Vec::new();
    for (i, chromosome) in population.iter_mut().enumerate() {
        if chromosome.repair(config.duplicate_repair, config.min_chromosome_length, rng) {
            chromosome.renew_id(rng);
            changed.push(i);
        }
    }
    changed
}

/// Perturbs chromosomes that duplicate the content of an earlier one.
///
/// Pairs are compared only when their identities differ and their lengths
/// match. The later chromosome of a duplicate pair receives noise on its
/// coordinates and frequency.
///
/// # Complexity
/// O(n² · L) for n chromosomes of length L
pub fn perturb_duplicates<R: Rng + ?Sized>(
    population: &mut [Chromosome],
    config: &GaConfig,
    rng: &mut R,
) -> Vec<usize> {
    let mut changed = Vec::new();
    for j in 1..population.len() {
        let (earlier, rest) = population.split_at_mut(j);
        let candidate = &mut rest[0];
        let duplicated = earlier.iter().any(|other| {
            !other.same_identity(candidate)
                && other.len() == candidate.len()
                && other.same_shape(candidate)
        });
        if duplicated {
            perturb(candidate, config, rng);
            changed.push(j);
        }
    }
    changed
}

/// Adds small noise to every point and to the frequency.
///
/// The result is always content-different from the input: if the noise is
/// too small to move any point, one point is redrawn.
pub fn perturb<R: Rng + ?Sized>(chromosome: &mut Chromosome, config: &GaConfig, rng: &mut R) {
    let before = chromosome.clone();
    let scale = config.diversity_noise;
    for p in chromosome.coordinates_mut().iter_mut() {
        p.0 += noise(config.noise, rng) * scale;
        p.1 += noise(config.noise, rng) * scale;
    }
    let freq = chromosome.freq() + noise(config.noise, rng) * config.freq_diversity_noise;
    chromosome.set_freq(freq.clamp(config.min_freq, config.max_freq));
    chromosome.repair(config.duplicate_repair, config.min_chromosome_length, rng);

    if chromosome.same_shape(&before) && !chromosome.is_empty() {
        let idx = rng.random_range(0..chromosome.len());
        chromosome.coordinates_mut().remove(idx);
        chromosome.add_random_point(rng);
    }
    chromosome.renew_id(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_repair_population_reports_changes() {
        let mut rng = create_rng(42);
        let cfg = GaConfig::default();
        let good = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let mut bad = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let x = bad.coordinates()[0].0;
        bad.coordinates_mut()[1].0 = x;

        let mut population = vec![good, bad];
        let changed = repair_population(&mut population, &cfg, &mut rng);
        assert_eq!(changed, vec![1]);
        assert!(population.iter().all(|c| c.is_well_formed() && c.len() == 5));
    }

    #[test]
    fn test_duplicates_are_broken() {
        let mut rng = create_rng(42);
        let cfg = GaConfig::default();
        let a = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let b = a.clone_with_new_id(&mut rng);
        let c = Chromosome::random(5, 1e6, 25e6, &mut rng);

        let mut population = vec![a, c, b];
        let changed = perturb_duplicates(&mut population, &cfg, &mut rng);
        assert_eq!(changed, vec![2]);
        assert!(!population[0].same_shape(&population[2]));
        assert!(population[2].is_well_formed());
    }

    #[test]
    fn test_same_identity_is_not_a_duplicate_pair() {
        let mut rng = create_rng(42);
        let cfg = GaConfig::default();
        let a = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let mut population = vec![a.clone(), a];
        assert!(perturb_duplicates(&mut population, &cfg, &mut rng).is_empty());
    }

    #[test]
    fn test_perturb_stays_close() {
        let mut rng = create_rng(7);
        let cfg = GaConfig::default();
        let original = Chromosome::random(6, 1e6, 25e6, &mut rng);
        let mut c = original.clone();
        perturb(&mut c, &cfg, &mut rng);
        assert!(!c.same_shape(&original));
        assert!(!c.same_identity(&original));
        assert_eq!(c.len(), original.len());
        for a in c.coordinates() {
            let near = original
                .coordinates()
                .iter()
                .any(|b| (a.0 - b.0).abs() < 0.1 && (a.1 - b.1).abs() < 0.1);
            assert!(near, "perturbed point {a:?} far from every original point");
        }
        assert!((c.freq() - original.freq()).abs() < 1e6);
    }

    #[test]
    fn test_perturb_with_zero_noise_still_differs() {
        let mut rng = create_rng(9);
        let cfg = GaConfig {
            diversity_noise: 0.0,
            freq_diversity_noise: 0.0,
            ..GaConfig::default()
        };
        let original = Chromosome::random(5, 1e6, 25e6, &mut rng);
        let mut c = original.clone();
        perturb(&mut c, &cfg, &mut rng);
        assert!(!c.same_shape(&original));
        assert_eq!(c.len(), 5);
        assert!(c.is_well_formed());
    }
}
