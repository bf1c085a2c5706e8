use crate::core::models::grain::Grain;
use crate::core::models::statistics::{BetaParams, PrimaryPhase};
use crate::core::orientation::DEFAULT_BINS_PER_AXIS;
use crate::core::orientation::bins_per_axis;
use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;
use rand_distr::{Beta, Normal};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{instrument, warn};

const MAX_DIAMETER_DRAWS: usize = 100_000;
const MAX_RATIO_DRAWS: usize = 10_000;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Phase {phase} has an invalid log-normal diameter model (mean {mean}, stdev {stdev})")]
    InvalidDiameterModel { phase: usize, mean: f64, stdev: f64 },
    #[error("Failed to create the orientation distribution of phase {phase}: {source}")]
    DistributionError {
        phase: usize,
        #[source]
        source: WeightedError,
    },
}

/// Draws candidate grains for one primary phase.
///
/// Degenerate beta bins borrow the nearest lower bin's distribution; when no lower bin is
/// usable the corresponding ratio or shape factor is 1.
pub struct DistributionSampler<'a> {
    phase: PrimaryPhase<'a>,
    diameter: Normal<f64>,
    b_over_a: Vec<Option<Beta<f64>>>,
    c_over_a: Vec<Option<Beta<f64>>>,
    omega3: Vec<Option<Beta<f64>>>,
    orientation: Option<(WeightedIndex<f64>, usize)>,
}

impl<'a> DistributionSampler<'a> {
    pub fn new(phase: PrimaryPhase<'a>) -> Result<Self, SamplingError> {
        let stats = phase.stats;
        let diameter = Normal::new(stats.diameter.mean, stats.diameter.stdev).map_err(|_| {
            SamplingError::InvalidDiameterModel {
                phase: phase.id,
                mean: stats.diameter.mean,
                stdev: stats.diameter.stdev,
            }
        })?;

        let orientation = match bins_per_axis(stats.axis_odf.len()) {
            Some(n) => match WeightedIndex::new(&stats.axis_odf) {
                Ok(index) => Some((index, n)),
                Err(WeightedError::AllWeightsZero | WeightedError::NoItem) => None,
                Err(source) => {
                    return Err(SamplingError::DistributionError {
                        phase: phase.id,
                        source,
                    });
                }
            },
            None => None,
        };

        Ok(Self {
            phase,
            diameter,
            b_over_a: beta_table(&stats.b_over_a),
            c_over_a: beta_table(&stats.c_over_a),
            omega3: beta_table(&stats.omega3),
            orientation,
        })
    }

    pub fn phase(&self) -> &PrimaryPhase<'a> {
        &self.phase
    }

    /// Draws an equivalent diameter in `[min, max)` from the log-normal model.
    pub fn sample_diameter(&self, rng: &mut impl Rng) -> f64 {
        let stats = self.phase.stats;
        let mut diameter = 0.0;
        for _ in 0..MAX_DIAMETER_DRAWS {
            diameter = self.diameter.sample(rng).exp();
            if diameter >= stats.min_diameter && diameter < stats.max_diameter {
                return diameter;
            }
        }
        warn!(
            phase = self.phase.id,
            "Diameter model rarely falls inside [{}, {}); clamping the last draw.",
            stats.min_diameter,
            stats.max_diameter
        );
        diameter.clamp(stats.min_diameter, stats.max_diameter)
    }

    /// Draws one complete candidate grain. The grain is active, unplaced and has no
    /// footprint yet.
    pub fn sample(&self, rng: &mut impl Rng) -> Grain {
        let stats = self.phase.stats;
        let diameter = self.sample_diameter(rng);
        let volume = PI / 6.0 * diameter.powi(3);
        let bin = stats.diameter_bin(diameter);

        let (mut b, mut c) = (1.0, 1.0);
        for _ in 0..MAX_RATIO_DRAWS {
            b = draw(&self.b_over_a[bin], rng);
            c = draw(&self.c_over_a[bin], rng);
            if b >= c {
                break;
            }
        }
        if b < c {
            std::mem::swap(&mut b, &mut c);
        }

        let (orientation_bin, bins) = match &self.orientation {
            Some((index, n)) => (index.sample(rng), *n),
            None => (
                rng.gen_range(0..DEFAULT_BINS_PER_AXIS.pow(3)),
                DEFAULT_BINS_PER_AXIS,
            ),
        };
        let euler_angles = self.phase.symmetry.euler_from_bin(orientation_bin, bins);

        let omega3 = if self.phase.shape.uses_shape_factor() {
            draw(&self.omega3[bin], rng)
        } else {
            1.0
        };

        let mut grain = Grain::degenerate(self.phase.id);
        grain.volume = volume;
        grain.equivalent_diameter = diameter;
        grain.axis_lengths = [1.0, b, c];
        grain.euler_angles = euler_angles;
        grain.omega3 = omega3;
        grain.active = true;
        grain
    }
}

fn beta_table(params: &[BetaParams]) -> Vec<Option<Beta<f64>>> {
    let mut table: Vec<Option<Beta<f64>>> = Vec::with_capacity(params.len());
    for p in params {
        let own = if p.is_degenerate() {
            None
        } else {
            Beta::new(p.alpha, p.beta).ok()
        };
        let resolved = own.or_else(|| table.last().cloned().flatten());
        table.push(resolved);
    }
    table
}

fn draw(distribution: &Option<Beta<f64>>, rng: &mut impl Rng) -> f64 {
    distribution.as_ref().map_or(1.0, |d| d.sample(rng))
}

/// Estimates how many grains fill `domain_volume` by drawing diameters only.
///
/// A domain without volume is estimated at one grain.
#[instrument(level = "debug", skip_all)]
pub fn estimate_grain_count(
    samplers: &[DistributionSampler],
    domain_volume: f64,
    rng: &mut impl Rng,
) -> usize {
    if !(domain_volume > 0.0) {
        return 1;
    }
    let mut count = 0;
    for sampler in samplers {
        let target = sampler.phase.fraction * domain_volume;
        let mut filled = 0.0;
        while filled < target {
            let d = sampler.sample_diameter(rng);
            filled += PI / 6.0 * d.powi(3);
            count += 1;
        }
    }
    count.max(1)
}
