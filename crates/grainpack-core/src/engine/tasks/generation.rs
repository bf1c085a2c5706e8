use crate::core::models::grain::Grain;
use crate::engine::context::PackingContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::scoring::size_similarity;
use crate::engine::tasks::{Flow, STAGE_GENERATING};
use crate::engine::utils::sampling::{DistributionSampler, estimate_grain_count};
use nalgebra::Vector3;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

/// Threshold decrement per consecutive rejection of the size-similarity acceptance rule.
const REJECTION_RELAXATION: f64 = 0.001;
/// A phase below this share of its target volume accepts every candidate.
const EARLY_ACCEPT_SHARE: f64 = 0.75;

/// Size-similarity acceptance of one candidate grain.
///
/// The improvement test is strict: a candidate that leaves the similarity unchanged only
/// gets in through the relaxed threshold or while the phase is below `early_volume`.
fn accepts(similarity: f64, previous: f64, rejections: u32, volume: f64, early_volume: f64) -> bool {
    similarity > previous
        || similarity > 1.0 - f64::from(rejections) * REJECTION_RELAXATION
        || volume < early_volume
}

struct Generator<'a, 'c, R: Rng> {
    context: &'c PackingContext<'a>,
    samplers: &'c [DistributionSampler<'a>],
    rng: &'c mut R,
    grains: Vec<Grain>,
    similarity: f64,
}

impl<R: Rng> Generator<'_, '_, R> {
    fn phase_volume(&self, phase: usize) -> f64 {
        self.grains
            .iter()
            .filter(|g| g.phase == phase)
            .map(|g| g.volume)
            .sum()
    }

    /// Draws grains for every phase until each reaches `multiplier ×` its target volume.
    fn fill(&mut self, multiplier: f64, early_factor: f64) -> Flow {
        let domain_volume = self.context.domain.volume();
        for sampler in self.samplers {
            let phase = *sampler.phase();
            let target = phase.fraction * domain_volume;
            let mut volume = self.phase_volume(phase.id);
            let mut rejections = 0u32;
            while volume < multiplier * target {
                if self.context.is_cancelled() {
                    return Flow::Cancelled;
                }
                let candidate = sampler.sample(self.rng);
                let similarity =
                    size_similarity(&self.grains, Some(&candidate), self.context.targets);
                rejections += 1;
                let early_volume = EARLY_ACCEPT_SHARE * early_factor * target;
                if accepts(similarity, self.similarity, rejections, volume, early_volume) {
                    volume += candidate.volume;
                    self.similarity = similarity;
                    self.grains.push(candidate);
                    rejections = 0;
                    self.context.reporter.report(Progress::TaskIncrement);
                }
            }
            debug!(
                phase = phase.id,
                grains = self.grains.iter().filter(|g| g.phase == phase.id).count(),
                volume,
                "Phase volume target reached."
            );
        }
        Flow::Completed
    }
}

/// Extra volume share generated for bounded domains, where grains straddling a face lose
/// part of their volume.
pub fn boundary_factor(grain_count: usize, size: Vector3<f64>) -> f64 {
    let n = grain_count as f64;
    let xg = (n * (size.x / size.y) * (size.x / size.z)).cbrt().floor() + 1.0;
    let yg = (xg * size.y / size.x).floor() + 1.0;
    let zg = (xg * size.z / size.x).floor() + 1.0;
    0.25 * (1.0 - ((xg - 2.0) * (yg - 2.0) * (zg - 2.0)) / (xg * yg * zg))
}

/// Samples the grain population of every primary phase.
///
/// A domain without volume yields a single degenerate grain.
#[instrument(skip_all, name = "generation_task")]
pub fn run(
    context: &PackingContext,
    samplers: &[DistributionSampler],
    rng: &mut impl Rng,
) -> Result<(Vec<Grain>, Flow), EngineError> {
    let first_phase = samplers
        .first()
        .map(|s| s.phase().id)
        .ok_or_else(|| EngineError::PhaseFailed {
            phase: STAGE_GENERATING,
            reason: "no grain sampler was prepared".to_string(),
        })?;

    let domain_volume = context.domain.volume();
    if !(domain_volume > 0.0) {
        warn!("Domain has no volume; producing a single degenerate grain.");
        return Ok((vec![Grain::degenerate(first_phase)], Flow::Completed));
    }

    let estimate = estimate_grain_count(samplers, domain_volume, rng);
    info!(estimate, "Generating grains.");
    context.reporter.report(Progress::TaskStart {
        total_steps: estimate as u64,
    });

    let mut generator = Generator {
        context,
        samplers,
        rng,
        grains: Vec::with_capacity(estimate),
        similarity: 0.0,
    };

    let mut flow = generator.fill(1.0, 1.0);
    if flow == Flow::Completed && !context.domain.periodic {
        let factor = boundary_factor(generator.grains.len(), context.domain.size());
        debug!(factor, "Generating extra grains for bounded faces.");
        flow = generator.fill(1.0 + factor, factor);
    }
    context.reporter.report(Progress::TaskFinish);

    info!(
        grains = generator.grains.len(),
        similarity = generator.similarity,
        "Grain generation finished."
    );
    Ok((generator.grains, flow))
}
