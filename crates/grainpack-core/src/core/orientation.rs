//! Crystallographic orientation helpers.
//!
//! Orientation-density tables are stored as a flat `n × n × n` grid over Bunge Euler
//! space (φ1 varies fastest). Each crystal symmetry defines the fundamental-zone extents
//! the grid spans; a bin maps back to the Euler angles at its center.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};

/// Bins per Euler axis used when a phase supplies no orientation table.
pub const DEFAULT_BINS_PER_AXIS: usize = 18;

/// Crystal symmetry of a phase, selecting the Euler-space extents of its orientation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrystalSymmetry {
    #[default]
    Cubic,
    Hexagonal,
    OrthoRhombic,
}

impl CrystalSymmetry {
    /// Upper bounds of (φ1, Φ, φ2) covered by this symmetry's orientation table.
    pub fn euler_extents(self) -> [f64; 3] {
        match self {
            Self::Cubic => [FRAC_PI_2, FRAC_PI_2, FRAC_PI_2],
            Self::Hexagonal => [2.0 * PI, FRAC_PI_2, FRAC_PI_3],
            Self::OrthoRhombic => [FRAC_PI_2, FRAC_PI_2, FRAC_PI_2],
        }
    }

    /// Converts a flat orientation bin into the Euler angles at the bin center.
    ///
    /// Bins beyond the table are clamped to the last bin.
    pub fn euler_from_bin(self, bin: usize, bins_per_axis: usize) -> [f64; 3] {
        let n = bins_per_axis.max(1);
        let bin = bin.min(n * n * n - 1);
        let idx = [bin % n, (bin / n) % n, bin / (n * n)];
        let extents = self.euler_extents();
        let mut angles = [0.0; 3];
        for axis in 0..3 {
            let step = extents[axis] / n as f64;
            angles[axis] = (idx[axis] as f64 + 0.5) * step;
        }
        angles
    }
}

/// Returns the number of bins per axis for an orientation table of `len` entries,
/// or `None` if `len` is not a perfect cube.
pub fn bins_per_axis(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let guess = (len as f64).cbrt().round() as usize;
    (guess.saturating_sub(1)..=guess + 1).find(|&n| n > 0 && n * n * n == len)
}

/// Bunge orientation matrix `g` for Euler angles (φ1, Φ, φ2).
///
/// Rows are the crystal axes expressed in the sample frame, so a sample-frame offset `d`
/// maps into grain-local coordinates as `g · d`.
pub fn orientation_matrix(euler: [f64; 3]) -> Matrix3<f64> {
    let (s1, c1) = euler[0].sin_cos();
    let (s, c) = euler[1].sin_cos();
    let (s2, c2) = euler[2].sin_cos();
    Matrix3::new(
        c1 * c2 - s1 * s2 * c,
        s1 * c2 + c1 * s2 * c,
        s2 * s,
        -c1 * s2 - s1 * c2 * c,
        -s1 * s2 + c1 * c2 * c,
        c2 * s,
        s1 * s,
        -c1 * s,
        c,
    )
}
