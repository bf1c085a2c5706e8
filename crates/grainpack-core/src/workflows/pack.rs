use crate::core::io::goal_attributes::write_goal_attributes;
use crate::core::io::vtk::{ScalarArray, StructuredPoints};
use crate::core::models::domain::Domain;
use crate::core::models::field::VoxelField;
use crate::core::models::grain::Grain;
use crate::core::models::statistics::StatisticsSet;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::PackingConfig;
use crate::engine::context::PackingContext;
use crate::engine::error::EngineError;
use crate::engine::packing_grid::PackingGrid;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scoring::build_targets;
use crate::engine::state::PackingState;
use crate::engine::tasks::{self, Flow};
use crate::engine::utils::sampling::DistributionSampler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, instrument, warn};

pub use crate::engine::tasks::{
    STAGE_CLEANUP, STAGE_COMPACTING, STAGE_GAP_FILLING, STAGE_GENERATING, STAGE_INITIAL_PLACEMENT,
    STAGE_NEIGHBOR_INIT, STAGE_RASTERIZING, STAGE_REFINING,
};

/// Status code of a domain without volume.
pub const EMPTY_DOMAIN_CODE: i32 = -400;

#[derive(Debug, Clone, PartialEq)]
pub enum PackingStatus {
    Complete,
    /// The run stopped at a cancellation check inside `stage`.
    Cancelled { stage: &'static str },
    Failed { code: i32, reason: String },
}

impl PackingStatus {
    pub fn code(&self) -> i32 {
        match self {
            Self::Complete => 0,
            Self::Cancelled { .. } => -1,
            Self::Failed { code, .. } => *code,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Figures collected along the run, for logging and summaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackingReport {
    pub generated_grains: usize,
    pub generated_volume: f64,
    pub filling_error: f64,
    pub moves_accepted: usize,
    pub neighborhood_similarity: f64,
    pub gap_fill_passes: usize,
    pub voxels_cleaned: usize,
}

#[derive(Debug, Clone)]
pub struct PackingOutcome {
    pub status: PackingStatus,
    /// Voxel ownership as last committed. Empty when the domain has no voxels.
    pub field: VoxelField,
    /// Final grains; after a complete run grain `i` owns the voxels with id `i + 1`.
    pub grains: Vec<Grain>,
    pub report: PackingReport,
}

fn stopped(
    stage: &'static str,
    grains: Vec<Grain>,
    field: VoxelField,
    report: PackingReport,
) -> PackingOutcome {
    warn!(stage, "Packing cancelled.");
    PackingOutcome {
        status: PackingStatus::Cancelled { stage },
        field,
        grains,
        report,
    }
}

fn write_packing_dump(path: &Path, grid: &PackingGrid) -> Result<(), EngineError> {
    let (owners, exclusion) = grid.snapshot();
    StructuredPoints {
        title: "grainpack packing grid",
        dims: grid.dims(),
        spacing: grid.cell_size(),
        scalars: vec![
            ScalarArray {
                name: "NumOwners",
                values: &owners,
            },
            ScalarArray {
                name: "ExclusionZone",
                values: &exclusion,
            },
        ],
    }
    .write_to_path(path)?;
    info!(path = %path.display(), "Packing grid written.");
    Ok(())
}

/// Grows grains into unassigned voxels. A voxel no grain can reach fails the stage.
fn fill_gaps(domain: &Domain, field: &mut VoxelField) -> Result<usize, EngineError> {
    let report = tasks::gap_fill::run(domain, field);
    if report.remaining > 0 {
        return Err(EngineError::PhaseFailed {
            phase: STAGE_GAP_FILLING,
            reason: format!("{} voxel(s) are not reachable from any grain", report.remaining),
        });
    }
    Ok(report.iterations)
}

/// Packs grains matching `statistics` into the configured domain.
///
/// Invalid statistics are reported as `Err` before any voxel array exists. A domain
/// without volume yields a `Failed` outcome holding one degenerate grain. Cancellation
/// yields a `Cancelled` outcome with whatever was committed when the token was seen. A
/// stage that cannot finish its job returns `EngineError::PhaseFailed`.
#[instrument(skip_all, name = "pack_workflow")]
pub fn run(
    statistics: &StatisticsSet,
    config: &PackingConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<PackingOutcome, EngineError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let phases = statistics.primary_phases()?;
    let targets = build_targets(&phases);
    let samplers = phases
        .iter()
        .map(|phase| DistributionSampler::new(*phase))
        .collect::<Result<Vec<_>, _>>()?;
    let context = PackingContext::new(config, &phases, &targets, reporter, cancel);
    let domain: Domain = context.domain;
    info!(
        phases = phases.len(),
        dims = ?domain.dims,
        periodic = domain.periodic,
        seed = config.seed,
        "Starting packing run."
    );
    reporter.report(Progress::PhaseFinish);

    let mut report = PackingReport::default();

    // === Phase 1: Generate grains ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_GENERATING,
    });
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (grains, flow) = tasks::generation::run(&context, &samplers, &mut rng)?;
    report.generated_grains = grains.len();
    report.generated_volume = grains.iter().map(|g| g.volume).sum();
    reporter.report(Progress::PhaseFinish);

    if !(domain.volume() > 0.0) {
        warn!("Domain has no volume; nothing to pack.");
        return Ok(PackingOutcome {
            status: PackingStatus::Failed {
                code: EMPTY_DOMAIN_CODE,
                reason: "domain has no volume".to_string(),
            },
            field: VoxelField::default(),
            grains,
            report,
        });
    }
    if flow.is_cancelled() {
        let field = VoxelField::new(domain.voxel_count());
        return Ok(stopped(STAGE_GENERATING, grains, field, report));
    }

    // === Phase 2: Initial placement ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_INITIAL_PLACEMENT,
    });
    let mut state = PackingState::new(grains, &phases, &domain);
    let flow = tasks::placement::run(&context, &mut state);
    reporter.report(Progress::PhaseFinish);
    if flow.is_cancelled() {
        let field = VoxelField::new(domain.voxel_count());
        return Ok(stopped(STAGE_INITIAL_PLACEMENT, state.into_grains(), field, report));
    }

    // === Phase 3: Neighbor counts ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_NEIGHBOR_INIT,
    });
    state.initialize_neighbors();
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Refinement ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_REFINING,
    });
    let summary = tasks::refinement::run(&context, &mut state, &mut rng)?;
    report.filling_error = summary.filling_error;
    report.moves_accepted = summary.accepted;
    report.neighborhood_similarity = summary.neighborhood;
    reporter.report(Progress::PhaseFinish);
    if summary.flow.is_cancelled() {
        let field = VoxelField::new(domain.voxel_count());
        return Ok(stopped(STAGE_REFINING, state.into_grains(), field, report));
    }
    if let Some(path) = &config.output.packing_dump_path {
        write_packing_dump(path, &state.grid)?;
    }

    // === Phase 5: Rasterization ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_RASTERIZING,
    });
    let (mut grains, shapes) = state.into_parts();
    let mut field = VoxelField::new(domain.voxel_count());
    let flow = tasks::rasterize::run(&context, &grains, &shapes, &mut field);
    reporter.report(Progress::PhaseFinish);
    if flow == Flow::Cancelled {
        return Ok(stopped(STAGE_RASTERIZING, grains, field, report));
    }
    tasks::compaction::run(&mut field, &mut grains);

    // === Phase 6: Gap filling ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_GAP_FILLING,
    });
    report.gap_fill_passes = fill_gaps(&domain, &mut field)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 7: Cleanup (optional) ===
    if config.cleanup {
        reporter.report(Progress::PhaseStart {
            name: STAGE_CLEANUP,
        });
        let cleanup = tasks::cleanup::run(&domain, &phases, &mut field);
        report.voxels_cleaned = cleanup.voxels_cleared;
        if cleanup.voxels_cleared > 0 {
            reporter.message(format!(
                "Cleanup cleared {} voxel(s) from {} fragment(s) and {} undersized grain(s)",
                cleanup.voxels_cleared, cleanup.fragments, cleanup.undersized
            ));
            report.gap_fill_passes += fill_gaps(&domain, &mut field)?;
        }
        reporter.report(Progress::PhaseFinish);
    }

    // === Phase 8: Compaction and exports ===
    reporter.report(Progress::PhaseStart {
        name: STAGE_COMPACTING,
    });
    tasks::compaction::run(&mut field, &mut grains);
    if config.output.write_goal_attributes {
        let path = config
            .output
            .goal_attributes_path
            .as_deref()
            .ok_or_else(|| EngineError::Internal("Goal attribute path is unset".to_string()))?;
        write_goal_attributes(path, &grains)?;
        info!(path = %path.display(), "Goal attributes written.");
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        grains = grains.len(),
        unassigned = field.unassigned_count(),
        "Packing complete."
    );
    Ok(PackingOutcome {
        status: PackingStatus::Complete,
        field,
        grains,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::field::UNASSIGNED;
    use crate::core::models::statistics::test_support::{phase_statistics, primary_entry};
    use crate::core::models::statistics::{PhaseEntry, PhaseType};
    use crate::core::orientation::CrystalSymmetry;
    use crate::core::shapes::ShapeClass;
    use crate::engine::config::PackingConfigBuilder;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn single_phase(median_diameter: f64) -> StatisticsSet {
        StatisticsSet {
            phases: vec![primary_entry(phase_statistics(1.0, median_diameter, 4))],
        }
    }

    fn config(dims: [usize; 3], periodic: bool, seed: u64) -> PackingConfigBuilder {
        PackingConfigBuilder::new()
            .dims(dims)
            .resolution([1.0; 3])
            .periodic(periodic)
            .moves_per_grain(5)
            .seed(seed)
    }

    fn pack(statistics: &StatisticsSet, config: &PackingConfig) -> PackingOutcome {
        run(statistics, config, &ProgressReporter::new(), &CancellationToken::new()).unwrap()
    }

    #[test]
    fn single_phase_run_fills_every_voxel() {
        let statistics = single_phase(10.0);
        let config = config([50, 50, 50], false, 1).build().unwrap();
        let outcome = pack(&statistics, &config);

        assert_eq!(outcome.status, PackingStatus::Complete);
        assert!(outcome.report.generated_volume >= 0.75 * 50f64.powi(3));
        assert_eq!(outcome.field.len(), 50 * 50 * 50);
        assert!(outcome.field.grain_ids.iter().all(|&id| id > 0));
        assert!(outcome.field.phases.iter().all(|&p| p == 1));
        let max_id = *outcome.field.grain_ids.iter().max().unwrap();
        assert_eq!(max_id as usize, outcome.grains.len());
    }

    #[test]
    fn two_phase_voxel_shares_follow_volume_fractions() {
        let statistics = StatisticsSet {
            phases: vec![
                primary_entry(phase_statistics(0.3, 6.0, 4)),
                primary_entry(phase_statistics(0.7, 6.0, 4)),
            ],
        };
        let seeds = [3, 17, 29];
        let mut share = 0.0;
        for seed in seeds {
            let config = config([30, 30, 30], true, seed).build().unwrap();
            let outcome = pack(&statistics, &config);
            let counts = outcome.field.phase_voxel_counts(2);
            share += counts[1] as f64 / (counts[1] + counts[2]) as f64;
        }
        share /= seeds.len() as f64;
        assert!((share - 0.3).abs() < 0.05, "phase 1 share = {share}");
    }

    #[test]
    fn zero_volume_domain_fails_with_one_degenerate_grain() {
        let statistics = single_phase(10.0);
        let config = config([0, 50, 50], false, 1).build().unwrap();
        let outcome = pack(&statistics, &config);
        assert_eq!(outcome.status.code(), EMPTY_DOMAIN_CODE);
        assert_eq!(outcome.grains.len(), 1);
        assert_eq!(outcome.grains[0].volume, 0.0);
        assert!(outcome.field.is_empty());
    }

    #[test]
    fn bounded_footprints_stay_inside_the_packing_grid() {
        let statistics = single_phase(6.0);
        let config = config([24, 20, 16], false, 8).build().unwrap();
        let outcome = pack(&statistics, &config);
        let grid_dims = [12i64, 10, 8];
        for grain in &outcome.grains {
            for cell in grain.footprint.iter() {
                for axis in 0..3 {
                    assert!(
                        (0..grid_dims[axis]).contains(&cell.cell[axis]),
                        "cell {:?} outside the grid",
                        cell.cell
                    );
                }
            }
        }
    }

    #[test]
    fn cancelling_during_refinement_returns_a_cancelled_outcome() {
        let statistics = single_phase(6.0);
        let config = config([24, 24, 24], true, 4).build().unwrap();
        let cancel = CancellationToken::new();
        let refining = Arc::new(AtomicBool::new(false));
        let moves = Arc::new(AtomicUsize::new(0));
        let reporter = {
            let cancel = cancel.clone();
            let refining = Arc::clone(&refining);
            let moves = Arc::clone(&moves);
            ProgressReporter::with_callback(Box::new(move |event| match event {
                Progress::PhaseStart { name } => {
                    refining.store(name == STAGE_REFINING, Ordering::SeqCst);
                }
                Progress::TaskIncrement if refining.load(Ordering::SeqCst) => {
                    if moves.fetch_add(1, Ordering::SeqCst) + 1 == 10 {
                        cancel.cancel();
                    }
                }
                _ => {}
            }))
        };

        let outcome = run(&statistics, &config, &reporter, &cancel).unwrap();
        assert_eq!(
            outcome.status,
            PackingStatus::Cancelled {
                stage: STAGE_REFINING
            }
        );
        assert_eq!(moves.load(Ordering::SeqCst), 10);
        assert!(!outcome.grains.is_empty());
        assert!(outcome.field.grain_ids.iter().all(|&id| id == UNASSIGNED));
    }

    #[test]
    fn same_seed_gives_the_same_microstructure() {
        let statistics = single_phase(6.0);
        let config = config([20, 20, 20], true, 12).build().unwrap();
        let first = pack(&statistics, &config);
        let second = pack(&statistics, &config);
        assert_eq!(first.field, second.field);
        assert_eq!(first.grains, second.grains);
    }

    #[test]
    fn missing_statistics_are_rejected_before_packing() {
        let statistics = StatisticsSet {
            phases: vec![PhaseEntry {
                phase_type: PhaseType::Primary,
                symmetry: CrystalSymmetry::Cubic,
                shape: ShapeClass::Ellipsoid,
                statistics: None,
            }],
        };
        let config = config([10, 10, 10], false, 1).build().unwrap();
        let error = run(
            &statistics,
            &config,
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(error.code(), -308);
    }

    #[test]
    fn configured_exports_are_written() {
        let dir = tempdir().unwrap();
        let goal = dir.path().join("out").join("goal.csv");
        let dump = dir.path().join("packing.vtk");
        let statistics = single_phase(6.0);
        let config = config([20, 20, 20], false, 6)
            .write_goal_attributes(true)
            .goal_attributes_path(goal.clone())
            .packing_dump_path(dump.clone())
            .build()
            .unwrap();
        let outcome = pack(&statistics, &config);

        let table = std::fs::read_to_string(goal).unwrap();
        let mut lines = table.lines();
        assert_eq!(lines.next().unwrap(), outcome.grains.len().to_string());
        assert!(lines.next().unwrap().starts_with("GrainId,Phase,Volume"));
        assert_eq!(lines.count(), outcome.grains.len());

        let grid = std::fs::read_to_string(dump).unwrap();
        assert!(grid.contains("DIMENSIONS 10 10 10\n"));
        assert!(grid.contains("SCALARS NumOwners int 1"));
        assert!(grid.contains("SCALARS ExclusionZone int 1"));
    }

    #[test]
    fn disabling_cleanup_skips_the_cleanup_stage() {
        let statistics = single_phase(6.0);
        let stages = Arc::new(std::sync::Mutex::new(Vec::new()));
        let reporter = {
            let stages = Arc::clone(&stages);
            ProgressReporter::with_callback(Box::new(move |event| {
                if let Progress::PhaseStart { name } = event {
                    stages.lock().unwrap().push(name);
                }
            }))
        };
        let config = config([16, 16, 16], true, 2).cleanup(false).build().unwrap();
        let outcome = run(&statistics, &config, &reporter, &CancellationToken::new()).unwrap();
        assert!(outcome.status.is_complete());
        let stages = stages.lock().unwrap();
        assert!(!stages.contains(&STAGE_CLEANUP));
        assert_eq!(stages.last(), Some(&STAGE_COMPACTING));
    }

    #[test]
    fn gap_filling_grows_a_single_seed_through_the_domain() {
        let domain = Domain::new([4, 4, 4], nalgebra::Vector3::new(1.0, 1.0, 1.0), false);
        let mut field = VoxelField::new(domain.voxel_count());
        field.grain_ids[0] = 1;
        field.phases[0] = 1;
        let passes = fill_gaps(&domain, &mut field).unwrap();
        assert!(passes > 0);
        assert!(field.grain_ids.iter().all(|&id| id == 1));
    }

    #[test]
    fn gap_filling_without_any_grain_fails_the_stage() {
        let domain = Domain::new([4, 4, 4], nalgebra::Vector3::new(1.0, 1.0, 1.0), false);
        let mut field = VoxelField::new(domain.voxel_count());
        let err = fill_gaps(&domain, &mut field).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PhaseFailed {
                phase: STAGE_GAP_FILLING,
                ..
            }
        ));
        assert_eq!(err.code(), -1000);
    }
}
