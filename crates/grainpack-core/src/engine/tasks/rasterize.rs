use crate::core::models::domain::Domain;
use crate::core::models::field::{NO_PHASE, UNASSIGNED, VoxelField};
use crate::core::models::grain::Grain;
use crate::core::shapes::GrainShape;
use crate::engine::context::PackingContext;
use crate::engine::progress::Progress;
use crate::engine::tasks::Flow;
use itertools::iproduct;
use nalgebra::Vector3;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scratch marker for a voxel no grain has claimed in this sweep.
const UNCLAIMED: i32 = -1;
/// Scratch marker for a voxel claimed by more than one grain.
const GAP: i32 = -2;

/// Voxel search box of one grain, in unwrapped voxel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBox {
    pub lo: [i64; 3],
    pub hi: [i64; 3],
}

impl VoxelBox {
    fn around(domain: &Domain, grain: &Grain, radius: f64) -> Self {
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for axis in 0..3 {
            let n = domain.dims[axis] as i64;
            let res = domain.resolution[axis];
            let center = ((grain.centroid[axis] - res / 2.0) / res) as i64;
            let extent = radius / res + 1.0;
            let (min, max) = if domain.periodic { (-n, 2 * n - 1) } else { (0, n - 1) };
            lo[axis] = ((center as f64 - extent) as i64).max(min);
            hi[axis] = ((center as f64 + extent) as i64).min(max);
        }
        Self { lo, hi }
    }

    /// Flat indices of the box's voxels after wrapping; a wrapped voxel may repeat.
    fn voxels<'d>(&self, domain: &'d Domain) -> impl Iterator<Item = usize> + 'd {
        let Self { lo, hi } = *self;
        let wrap = move |c: i64, axis: usize| c.rem_euclid(domain.dims[axis] as i64) as usize;
        iproduct!(lo[2]..=hi[2], lo[1]..=hi[1], lo[0]..=hi[0])
            .map(move |(plane, row, column)| domain.index(wrap(column, 0), wrap(row, 1), wrap(plane, 2)))
    }
}

/// Writes grain ownership into the voxel field.
///
/// Holds the scratch owner and insideness buffers of one sweep. A voxel inside exactly
/// one grain is committed to that grain; a voxel inside several grains becomes a gap for
/// the gap filler.
pub struct Rasterizer {
    domain: Domain,
    owners: Vec<i32>,
    insideness: Vec<f64>,
}

impl Rasterizer {
    pub fn new(domain: Domain) -> Self {
        let count = domain.voxel_count();
        Self {
            domain,
            owners: vec![UNCLAIMED; count],
            insideness: vec![0.0; count],
        }
    }

    /// Claims the voxels inside `shape` for grain `id` in the scratch buffers.
    ///
    /// Every z-plane of the domain is an independent block: the planes the box wraps onto
    /// are only ever written by the worker owning them.
    pub fn sweep(&mut self, id: i32, grain: &Grain, shape: &GrainShape) -> VoxelBox {
        let domain = self.domain;
        let bbox = VoxelBox::around(&domain, grain, shape.primary_radius());
        let plane_len = domain.dims[0] * domain.dims[1];
        if plane_len == 0 || self.owners.is_empty() {
            return bbox;
        }
        let centroid = grain.centroid;
        let res = domain.resolution;
        let planes_z = domain.dims[2] as i64;

        let sweep_plane = |(z, (owners, insideness)): (usize, (&mut [i32], &mut [f64]))| {
            for plane in (bbox.lo[2]..=bbox.hi[2]).filter(|p| p.rem_euclid(planes_z) as usize == z) {
                let dz = plane as f64 * res.z - centroid.z;
                for row in bbox.lo[1]..=bbox.hi[1] {
                    let dy = row as f64 * res.y - centroid.y;
                    let y = row.rem_euclid(domain.dims[1] as i64) as usize;
                    for column in bbox.lo[0]..=bbox.hi[0] {
                        let dx = column as f64 * res.x - centroid.x;
                        let inside = shape.insideness(&Vector3::new(dx, dy, dz));
                        if inside < 0.0 {
                            continue;
                        }
                        let x = column.rem_euclid(domain.dims[0] as i64) as usize;
                        let local = y * domain.dims[0] + x;
                        match owners[local] {
                            UNCLAIMED => {
                                owners[local] = id;
                                insideness[local] = inside;
                            }
                            owner if owner == id => {
                                insideness[local] = insideness[local].max(inside);
                            }
                            GAP => {}
                            _ => owners[local] = GAP,
                        }
                    }
                }
            }
        };

        #[cfg(feature = "parallel")]
        self.owners
            .par_chunks_mut(plane_len)
            .zip(self.insideness.par_chunks_mut(plane_len))
            .enumerate()
            .for_each(sweep_plane);
        #[cfg(not(feature = "parallel"))]
        self.owners
            .chunks_mut(plane_len)
            .zip(self.insideness.chunks_mut(plane_len))
            .enumerate()
            .for_each(sweep_plane);

        bbox
    }

    /// Commits the outcome of grain `id`'s sweep over `bbox` into the field.
    ///
    /// Voxels the grain holds alone take its id and phase. Voxels that turned into gaps
    /// during the sweep lose any id committed by an earlier grain.
    pub fn commit(&self, id: i32, phase: usize, bbox: &VoxelBox, field: &mut VoxelField) {
        for voxel in bbox.voxels(&self.domain) {
            match self.owners[voxel] {
                owner if owner == id => {
                    field.grain_ids[voxel] = id;
                    field.phases[voxel] = phase as i32;
                }
                GAP => {
                    field.grain_ids[voxel] = UNASSIGNED;
                    field.phases[voxel] = NO_PHASE;
                }
                _ => {}
            }
        }
    }

    /// Scratch owner of a voxel: a grain id, or a negative marker.
    #[cfg(test)]
    pub fn scratch_owner(&self, voxel: usize) -> i32 {
        self.owners[voxel]
    }

    pub fn reset(&mut self) {
        self.owners.fill(UNCLAIMED);
        self.insideness.fill(0.0);
    }
}

/// Rasterizes every active grain in id order. Grain `i` is written as id `i + 1`.
#[instrument(skip_all, name = "rasterize_task")]
pub fn run(
    context: &PackingContext,
    grains: &[Grain],
    shapes: &[GrainShape],
    field: &mut VoxelField,
) -> Flow {
    info!(grains = grains.len(), voxels = field.len(), "Rasterizing grains.");
    context.reporter.report(Progress::TaskStart {
        total_steps: grains.len() as u64,
    });

    let mut rasterizer = Rasterizer::new(context.domain);
    let mut flow = Flow::Completed;
    for (index, (grain, shape)) in grains.iter().zip(shapes).enumerate() {
        if context.is_cancelled() {
            flow = Flow::Cancelled;
            break;
        }
        if grain.active {
            let id = index as i32 + 1;
            let bbox = rasterizer.sweep(id, grain, shape);
            rasterizer.commit(id, grain.phase, &bbox, field);
            debug!(grain = id, ?bbox, "Grain rasterized.");
        }
        context.reporter.report(Progress::TaskIncrement);
    }
    rasterizer.reset();

    context.reporter.report(Progress::TaskFinish);
    info!(unassigned = field.unassigned_count(), "Rasterization finished.");
    flow
}
