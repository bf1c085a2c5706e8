//! Target distributions and the similarity scorers that compare packed grains against them.
//!
//! Both scorers rebuild the simulated histogram from the current grain list on every call
//! and return a similarity that callers maximize. Scores of several primary phases are
//! summed.

use super::histogram::{Histogram, similarity};
use super::neighbors::update_neighbors;
use crate::core::models::grain::Grain;
use crate::core::models::statistics::PrimaryPhase;
use crate::core::utils::special::lognormal_cdf;

pub const SIZE_BINS: usize = 40;
pub const NEIGHBOR_BINS: usize = 40;
pub const NEIGHBOR_BIN_WIDTH: i32 = 2;

/// Precomputed target histograms of one primary phase.
#[derive(Debug, Clone)]
pub struct PhaseTargets<'a> {
    pub phase: PrimaryPhase<'a>,
    size_origin: f64,
    size_step: f64,
    size: Histogram,
    neighbors: Histogram,
}

impl<'a> PhaseTargets<'a> {
    pub fn new(phase: PrimaryPhase<'a>) -> Self {
        let stats = phase.stats;
        let size_origin = stats.min_diameter / 2.0;
        let size_step = (2.0 * stats.max_diameter - size_origin) / SIZE_BINS as f64;
        let (mu, sigma) = (stats.diameter.mean, stats.diameter.stdev);

        let mut size = Histogram::new(1, SIZE_BINS);
        for j in 0..SIZE_BINS {
            let lo = size_origin + j as f64 * size_step;
            let hi = lo + size_step;
            size.add(0, j, lognormal_cdf(hi, mu, sigma) - lognormal_cdf(lo, mu, sigma));
        }

        let mut neighbors = Histogram::new(stats.bin_count(), NEIGHBOR_BINS);
        for (row, model) in stats.neighbors.iter().enumerate() {
            for j in 0..NEIGHBOR_BINS {
                let lo = (j as i32 * NEIGHBOR_BIN_WIDTH) as f64;
                let hi = lo + NEIGHBOR_BIN_WIDTH as f64;
                let mass = lognormal_cdf(hi, model.mean, model.stdev)
                    - lognormal_cdf(lo, model.mean, model.stdev);
                neighbors.add(row, j, mass.max(0.0));
            }
        }
        neighbors.normalize();

        Self {
            phase,
            size_origin,
            size_step,
            size,
            neighbors,
        }
    }

    pub fn size_target(&self) -> &Histogram {
        &self.size
    }

    pub fn neighbor_target(&self) -> &Histogram {
        &self.neighbors
    }

    fn size_bin(&self, diameter: f64) -> usize {
        let raw = ((diameter - self.size_origin) / self.size_step).max(0.0) as usize;
        raw.min(SIZE_BINS - 1)
    }

    fn neighbor_bin(neighbors: i32) -> usize {
        ((neighbors.max(0) / NEIGHBOR_BIN_WIDTH) as usize).min(NEIGHBOR_BINS - 1)
    }

    fn diameter_bin(&self, diameter: f64) -> usize {
        let stats = self.phase.stats;
        stats.diameter_bin(diameter.clamp(stats.min_diameter, stats.max_diameter))
    }
}

pub fn build_targets<'a>(phases: &[PrimaryPhase<'a>]) -> Vec<PhaseTargets<'a>> {
    phases.iter().copied().map(PhaseTargets::new).collect()
}

/// Size-distribution similarity of the active grains plus an optional candidate.
pub fn size_similarity(grains: &[Grain], candidate: Option<&Grain>, targets: &[PhaseTargets]) -> f64 {
    targets
        .iter()
        .map(|target| {
            let mut simulated = Histogram::new(1, SIZE_BINS);
            grains
                .iter()
                .filter(|g| g.active)
                .chain(candidate)
                .filter(|g| g.phase == target.phase.id)
                .for_each(|g| simulated.add(0, target.size_bin(g.equivalent_diameter), 1.0));
            simulated.normalize();
            similarity(&simulated, target.size_target())
        })
        .sum()
}

/// Neighborhood similarity with the grain at `removed` taken out of the packing.
///
/// The removed grain's neighbor relations are withdrawn while the histogram is built and
/// restored before returning, so grain neighbor counts are unchanged afterwards.
pub fn neighborhood_similarity(
    grains: &mut [Grain],
    removed: Option<usize>,
    targets: &[PhaseTargets],
) -> f64 {
    let removed = removed.filter(|&i| grains[i].active);
    if let Some(index) = removed {
        update_neighbors(grains, index, -1);
    }

    let score: f64 = targets
        .iter()
        .map(|target| {
            let rows = target.phase.stats.bin_count();
            let mut simulated = Histogram::new(rows, NEIGHBOR_BINS);
            let mut counts = vec![0usize; rows];
            for (index, g) in grains.iter().enumerate() {
                if Some(index) == removed || !g.active || g.phase != target.phase.id {
                    continue;
                }
                let row = target.diameter_bin(g.equivalent_diameter);
                simulated.add(row, PhaseTargets::neighbor_bin(g.neighbors), 1.0);
                counts[row] += 1;
            }
            simulated.normalize_rows(&counts);
            simulated.normalize();
            similarity(&simulated, target.neighbor_target())
        })
        .sum();

    if let Some(index) = removed {
        update_neighbors(grains, index, 1);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::statistics::test_support::single_phase_set;
    use nalgebra::Point3;

    fn grain(diameter: f64, x: f64) -> Grain {
        let mut g = Grain::degenerate(1);
        g.active = true;
        g.equivalent_diameter = diameter;
        g.centroid = Point3::new(x, 0.0, 0.0);
        g
    }

    #[test]
    fn size_target_is_a_distribution() {
        let set = single_phase_set(10.0);
        let phases = set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let total = targets[0].size_target().total();
        assert!((total - 1.0).abs() < 1e-3, "total = {total}");
        let neighbor_total = targets[0].neighbor_target().total();
        assert!((neighbor_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn grains_near_the_median_score_better_than_outliers() {
        let set = single_phase_set(10.0);
        let phases = set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let typical: Vec<_> = (0..20).map(|i| grain(9.0 + 0.1 * i as f64, 0.0)).collect();
        let outliers: Vec<_> = (0..20).map(|_| grain(6.0, 0.0)).collect();
        let good = size_similarity(&typical, None, &targets);
        let bad = size_similarity(&outliers, None, &targets);
        assert!(good > bad);
        assert!(good <= 1.0 + 1e-9);
    }

    #[test]
    fn candidate_is_included_in_size_similarity() {
        let set = single_phase_set(10.0);
        let phases = set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        assert_eq!(size_similarity(&[], None, &targets), 0.0);
        assert!(size_similarity(&[], Some(&grain(10.0, 0.0)), &targets) > 0.0);
    }

    #[test]
    fn neighborhood_similarity_restores_neighbor_counts() {
        let set = single_phase_set(10.0);
        let phases = set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let mut grains: Vec<_> = (0..5).map(|i| grain(10.0, 3.0 * i as f64)).collect();
        crate::engine::neighbors::initialize_neighbors(&mut grains);
        let before: Vec<_> = grains.iter().map(|g| g.neighbors).collect();
        let score = neighborhood_similarity(&mut grains, Some(2), &targets);
        let after: Vec<_> = grains.iter().map(|g| g.neighbors).collect();
        assert_eq!(before, after);
        assert!((0.0..=1.0 + 1e-9).contains(&score));
    }

    #[test]
    fn neighborhood_similarity_of_no_grains_is_zero() {
        let set = single_phase_set(10.0);
        let phases = set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        assert_eq!(neighborhood_similarity(&mut [], None, &targets), 0.0);
    }
}
