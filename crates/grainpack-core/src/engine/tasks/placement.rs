use crate::engine::context::PackingContext;
use crate::engine::packing_grid::PackingGrid;
use crate::engine::progress::Progress;
use crate::engine::state::PackingState;
use crate::engine::tasks::Flow;
use tracing::{debug, info, instrument};

/// First cell at or after `start` (wrapping) that no footprint covers and no exclusion
/// zone claims. Falls back to `start` when the grid is full.
pub fn probe_free_cell(grid: &PackingGrid, start: usize) -> usize {
    let count = grid.cell_count();
    (0..count)
        .map(|step| (start + step) % count)
        .find(|&cell| grid.owners(cell) == 0 && !grid.is_excluded(cell))
        .unwrap_or(start)
}

/// First cell at or after `start` (wrapping) outside every exclusion zone.
pub fn probe_unexcluded_cell(grid: &PackingGrid, start: usize) -> usize {
    let count = grid.cell_count();
    (0..count)
        .map(|step| (start + step) % count)
        .find(|&cell| !grid.is_excluded(cell))
        .unwrap_or(start)
}

/// Puts every active grain on the packing grid.
///
/// Each grain's footprint is built at the domain center, then the grain moves to the
/// first free cell found by probing forward from the center cell. Grains are added to the
/// grid one at a time, so later grains probe past the cells of earlier ones.
#[instrument(skip_all, name = "placement_task")]
pub fn run(context: &PackingContext, state: &mut PackingState) -> Flow {
    let center = context.domain.center();
    let cell_count = state.grid.cell_count();
    let center_cell = state.grid.resolve(state.grid.cell_of(&center)).unwrap_or(0);
    info!(grains = state.len(), cells = cell_count, "Placing grains.");
    context.reporter.report(Progress::TaskStart {
        total_steps: state.len() as u64,
    });

    for index in 0..state.len() {
        if context.is_cancelled() {
            context.reporter.report(Progress::TaskFinish);
            return Flow::Cancelled;
        }
        if !state.grains[index].active {
            continue;
        }
        state.place(index, center);

        let cell = probe_free_cell(&state.grid, center_cell);
        let target = state.grid.cell_center(state.grid.coords(cell));
        state.relocate(index, target);
        state.add_to_grid(index);

        debug!(
            grain = index,
            cell,
            footprint = state.grains[index].footprint.len(),
            "Grain placed."
        );
        context.reporter.report(Progress::TaskIncrement);
    }

    state.rebuild_available_points();
    context.reporter.report(Progress::TaskFinish);
    info!(
        filling_error = state.error.value(),
        available = state.available.len(),
        "Initial placement finished."
    );
    Flow::Completed
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
    use std::f64::consts::PI;

    struct Fixture {
        set: StatisticsSet,
        config: PackingConfig,
    }

    fn setup(periodic: bool) -> Fixture {
        Fixture {
            set: single_phase_set(4.0),
            config: PackingConfigBuilder::new()
                .dims([16, 16, 16])
                .resolution([1.0; 3])
                .periodic(periodic)
                .seed(11)
                .build()
                .unwrap(),
        }
    }

    fn grains(count: usize) -> Vec<Grain> {
        (0..count)
            .map(|_| {
                let mut g = Grain::degenerate(1);
                g.active = true;
                g.equivalent_diameter = 4.0;
                g.volume = PI / 6.0 * 64.0;
                g
            })
            .collect()
    }

    fn place(fixture: &Fixture, count: usize, cancel: &CancellationToken) -> (PackingState, Flow) {
        let phases = fixture.set.primary_phases().unwrap();
        let targets = build_targets(&phases);
        let reporter = ProgressReporter::new();
        let context = PackingContext::new(&fixture.config, &phases, &targets, &reporter, cancel);
        let mut state = PackingState::new(grains(count), &phases, &context.domain);
        let flow = run(&context, &mut state);
        (state, flow)
    }

    #[test]
    fn probing_skips_occupied_and_excluded_cells() {
        let fixture = setup(true);
        let (state, _) = place(&fixture, 1, &CancellationToken::new());
        let occupied = (0..state.grid.cell_count())
            .find(|&c| state.grid.owners(c) > 0)
            .unwrap();
        let free = probe_free_cell(&state.grid, occupied);
        assert_eq!(state.grid.owners(free), 0);
        assert!(!state.grid.is_excluded(free));
    }

    fn center_cell(state: &PackingState, fixture: &Fixture) -> usize {
        let center = fixture.config.domain().center();
        state.grid.resolve(state.grid.cell_of(&center)).unwrap()
    }

    fn cell_index(state: &PackingState, grain: &Grain) -> usize {
        state.grid.resolve(state.grid.cell_of(&grain.centroid)).unwrap()
    }

    #[test]
    fn first_grain_takes_the_center_cell() {
        let fixture = setup(false);
        let (state, _) = place(&fixture, 1, &CancellationToken::new());
        assert_eq!(cell_index(&state, &state.grains[0]), center_cell(&state, &fixture));
    }

    #[test]
    fn later_grains_probe_forward_from_the_center() {
        let fixture = setup(false);
        let (state, _) = place(&fixture, 2, &CancellationToken::new());
        let center = center_cell(&state, &fixture);
        let second = cell_index(&state, &state.grains[1]);
        assert!(second > center);
        for cell in center..second {
            assert!(state.grid.owners(cell) > 0 || state.grid.is_excluded(cell));
        }
    }

    #[test]
    fn grains_are_spread_over_distinct_cells() {
        let fixture = setup(true);
        let (state, flow) = place(&fixture, 4, &CancellationToken::new());
        assert_eq!(flow, Flow::Completed);
        let cells: Vec<_> = state
            .grains
            .iter()
            .map(|g| state.grid.cell_of(&g.centroid))
            .collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(state.grains.iter().all(|g| !g.footprint.is_empty()));
    }

    #[test]
    fn bounded_footprints_stay_inside_the_grid() {
        let fixture = setup(false);
        let (state, _) = place(&fixture, 6, &CancellationToken::new());
        let dims = state.grid.dims();
        for grain in &state.grains {
            for cell in grain.footprint.iter() {
                for axis in 0..3 {
                    assert!((0..dims[axis] as i64).contains(&cell.cell[axis]));
                }
            }
        }
    }

    #[test]
    fn available_points_exclude_covered_zones() {
        let fixture = setup(true);
        let (state, _) = place(&fixture, 3, &CancellationToken::new());
        for cell in 0..state.grid.cell_count() {
            assert_eq!(state.available.contains(cell), !state.grid.is_excluded(cell));
        }
    }

    #[test]
    fn cancelled_placement_leaves_grains_unplaced() {
        let fixture = setup(true);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (state, flow) = place(&fixture, 3, &cancel);
        assert_eq!(flow, Flow::Cancelled);
        assert!(state.grains.iter().all(|g| g.footprint.is_empty()));
    }
}
