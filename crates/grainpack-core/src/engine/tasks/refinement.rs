use super::placement::probe_unexcluded_cell;
use crate::engine::context::PackingContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::scoring::neighborhood_similarity;
use crate::engine::state::PackingState;
use crate::engine::tasks::Flow;
use nalgebra::Point3;
use rand::Rng;
use tracing::{debug, info, instrument, trace};

/// Largest nudge along an axis, in packing-grid cells.
const NUDGE_CELLS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Jump,
    Nudge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementSummary {
    pub iterations: usize,
    pub accepted: usize,
    pub filling_error: f64,
    /// Neighborhood similarity after the last evaluated move.
    pub neighborhood: f64,
    pub flow: Flow,
}

/// A grain whose centroid cell is shared with another footprint, searched forward from a
/// random start. Falls back to the start grain when no cell is shared.
fn select_crowded_grain(state: &PackingState, rng: &mut impl Rng) -> usize {
    let count = state.len();
    let start = rng.gen_range(0..count);
    (0..count)
        .map(|step| (start + step) % count)
        .find(|&index| {
            let grain = &state.grains[index];
            grain.active
                && state
                    .grid
                    .resolve(state.grid.cell_of(&grain.centroid))
                    .is_some_and(|cell| state.grid.owners(cell) > 1)
        })
        .unwrap_or(start)
}

/// Coordinate after a nudge by `step`. An overshoot lands on the domain face instead of
/// keeping the old coordinate, so a grain near a face can still move toward it.
fn nudged(current: f64, step: f64, size: f64) -> f64 {
    (current + step).clamp(0.0, size)
}

fn propose(state: &PackingState, index: usize, kind: MoveKind, rng: &mut impl Rng) -> Point3<f64> {
    let grid = &state.grid;
    match kind {
        MoveKind::Jump => {
            let cell = state.available.choose(rng).unwrap_or_else(|| {
                let start = rng.gen_range(0..grid.cell_count());
                probe_unexcluded_cell(grid, start)
            });
            grid.cell_center(grid.coords(cell))
        }
        MoveKind::Nudge => {
            let current = state.grains[index].centroid;
            let cell_size = grid.cell_size();
            let extent = grid.dims();
            let mut target = current;
            for axis in 0..3 {
                let size = extent[axis] as f64 * cell_size[axis];
                let step = (2.0 * rng.r#gen::<f64>() - 1.0) * NUDGE_CELLS * cell_size[axis];
                target[axis] = nudged(current[axis], step, size);
            }
            target
        }
    }
}

/// Greedy local search over grain positions.
///
/// Runs `moves_per_grain × (n − 1)` iterations alternating jumps to random free cells and
/// short nudges. A move is kept when it does not increase the filling error. The
/// neighborhood similarity of the packing is evaluated after every move and reported, but
/// it does not take part in the decision.
#[instrument(skip_all, name = "refinement_task")]
pub fn run(
    context: &PackingContext,
    state: &mut PackingState,
    rng: &mut impl Rng,
) -> Result<RefinementSummary, EngineError> {
    let iterations = context.config.moves_per_grain * state.len().saturating_sub(1);
    info!(iterations, filling_error = state.error.value(), "Refining grain positions.");
    context.reporter.report(Progress::TaskStart {
        total_steps: iterations as u64,
    });

    let mut summary = RefinementSummary {
        iterations: 0,
        accepted: 0,
        filling_error: state.error.value(),
        neighborhood: 0.0,
        flow: Flow::Completed,
    };

    for iteration in 0..iterations {
        if context.is_cancelled() {
            summary.flow = Flow::Cancelled;
            break;
        }
        let kind = if iteration % 2 == 0 {
            MoveKind::Jump
        } else {
            MoveKind::Nudge
        };
        let index = select_crowded_grain(state, rng);
        let target = propose(state, index, kind, rng);
        let old_error = state.error;

        let mut neighborhood = summary.neighborhood;
        let kept = state.transaction(index, |s| {
            s.remove_from_grid(index);
            s.relocate(index, target);
            s.add_to_grid(index);
            neighborhood = neighborhood_similarity(&mut s.grains, Some(index), context.targets);
            Ok(s.error.value() <= old_error.value())
        })?;
        summary.neighborhood = neighborhood;
        summary.iterations += 1;
        if kept {
            summary.accepted += 1;
        }
        trace!(iteration, ?kind, grain = index, kept, error = state.error.value());
        context.reporter.report(Progress::TaskIncrement);
    }

    summary.filling_error = state.error.value();
    context.reporter.report(Progress::TaskFinish);
    debug!(accepted = summary.accepted, "Moves accepted.");
    info!(
        iterations = summary.iterations,
        filling_error = summary.filling_error,
        neighborhood = summary.neighborhood,
        "Refinement finished."
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::grain::Grain;
    use crate::core::models::statistics::StatisticsSet;
    use crate::core::models::statistics::test_support::single_phase_set;
    use crate::engine::cancel::CancellationToken;
    use crate::engine::config::{PackingConfig, PackingConfigBuilder};
    use crate::engine::progress::ProgressReporter;
    use crate::engine::scoring::build_targets;
    use crate::engine::tasks::placement;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    struct Fixture {
        set: StatisticsSet,
        config: PackingConfig,
    }

    fn setup(periodic: bool, moves: usize) -> Fixture {
        Fixture {
            set: single_phase_set(5.0),
            config: PackingConfigBuilder::new()
                .dims([20, 20, 20])
                .resolution([1.0; 3])
                .periodic(periodic)
                .moves_per_grain(moves)
                .seed(2)
                .build()
                .unwrap(),
        }
    }

    fn refine(fixture: &Fixture, cancel: &CancellationToken) -> (PackingState, f64, RefinementSummary) {
        let phases = fixture.set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let reporter = ProgressReporter::new();
        let context = PackingContext::new(&fixture.config, &phases, &targets, &reporter, cancel);
        let grains = (0..12)
            .map(|_| {
                let mut g = Grain::degenerate(1);
                g.active = true;
                g.equivalent_diameter = 5.0;
                g.volume = PI / 6.0 * 125.0;
                g
            })
            .collect();
        let mut state = PackingState::new(grains, &phases, &context.domain);
        let mut rng = StdRng::seed_from_u64(fixture.config.seed);
        // Stack every grain on one cell so refinement has overlap to resolve.
        for index in 0..state.len() {
            state.place(index, context.domain.center());
            state.add_to_grid(index);
        }
        state.rebuild_available_points();
        state.initialize_neighbors();
        let before = state.error.value();
        let summary = run(&context, &mut state, &mut rng).unwrap();
        (state, before, summary)
    }

    #[test]
    fn refinement_never_increases_the_filling_error() {
        let fixture = setup(true, 20);
        let (state, before, summary) = refine(&fixture, &CancellationToken::new());
        assert_eq!(summary.flow, Flow::Completed);
        assert_eq!(summary.iterations, 20 * 11);
        assert!(summary.accepted > 0);
        assert!(state.error.value() < before);
        assert_eq!(summary.filling_error, state.error.value());
    }

    #[test]
    fn neighbor_counts_stay_consistent_with_positions() {
        let fixture = setup(true, 10);
        let (mut state, _, _) = refine(&fixture, &CancellationToken::new());
        let tracked: Vec<i32> = state.grains.iter().map(|g| g.neighbors).collect();
        crate::engine::neighbors::initialize_neighbors(&mut state.grains);
        let recomputed: Vec<i32> = state.grains.iter().map(|g| g.neighbors).collect();
        assert_eq!(tracked, recomputed);
    }

    #[test]
    fn bounded_refinement_keeps_footprints_inside_the_grid() {
        let fixture = setup(false, 10);
        let (state, _, _) = refine(&fixture, &CancellationToken::new());
        let dims = state.grid.dims();
        let size = fixture.config.domain().size();
        for grain in &state.grains {
            for axis in 0..3 {
                assert!((0.0..=size[axis]).contains(&grain.centroid[axis]));
            }
            for cell in grain.footprint.iter() {
                for axis in 0..3 {
                    assert!((0..dims[axis] as i64).contains(&cell.cell[axis]));
                }
            }
        }
    }

    #[test]
    fn cancellation_stops_before_the_first_move() {
        let fixture = setup(true, 10);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (_, before, summary) = refine(&fixture, &cancel);
        assert_eq!(summary.flow, Flow::Cancelled);
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.filling_error, before);
    }

    #[test]
    fn nudges_past_a_face_land_on_the_face() {
        assert_eq!(nudged(1.0, -3.0, 20.0), 0.0);
        assert_eq!(nudged(19.0, 3.0, 20.0), 20.0);
        assert_eq!(nudged(10.0, 2.5, 20.0), 12.5);
    }

    #[test]
    fn placement_then_refinement_runs_end_to_end() {
        let fixture = setup(true, 5);
        let phases = fixture.set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let reporter = ProgressReporter::new();
        let cancel = CancellationToken::new();
        let context = PackingContext::new(&fixture.config, &phases, &targets, &reporter, &cancel);
        let grains = (0..6)
            .map(|_| {
                let mut g = Grain::degenerate(1);
                g.active = true;
                g.equivalent_diameter = 5.0;
                g.volume = PI / 6.0 * 125.0;
                g
            })
            .collect();
        let mut state = PackingState::new(grains, &phases, &context.domain);
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(placement::run(&context, &mut state), Flow::Completed);
        state.initialize_neighbors();
        let summary = run(&context, &mut state, &mut rng).unwrap();
        assert_eq!(summary.iterations, 25);
    }
}
