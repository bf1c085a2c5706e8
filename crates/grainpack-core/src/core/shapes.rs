//! Implicit shape functions for grains.
//!
//! Every shape class is an implicit function over axis-normalized, grain-local coordinates
//! `u = (x / r1, y / r2, z / r3)`. The function returns an *insideness* value that is
//! non-negative inside the shape and negative outside; its magnitude grows towards the
//! shape's core, which the rasterizer and the filling-error evaluator use as a weight.
//!
//! A [`ShapeClass`] is the per-phase choice read from the statistics. Because some classes
//! derive extra parameters from a grain's shape factor (Ω3), the class is resolved once per
//! grain into a [`ShapeFunction`], and combined with the grain's radii and orientation into a
//! [`GrainShape`] that can be evaluated cheaply per cell.

use super::orientation::orientation_matrix;
use super::utils::special::ln_gamma;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MIN_SUPERELLIPSOID_EXPONENT: f64 = 2.0;
const MAX_SUPERELLIPSOID_EXPONENT: f64 = 32.0;
const EXPONENT_BISECTION_STEPS: usize = 60;

/// The shape class assigned to a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeClass {
    #[default]
    Ellipsoid,
    SuperEllipsoid,
    CubeOctahedron,
    Cylinder,
    Unknown,
}

impl ShapeClass {
    /// Whether the class uses the sampled shape factor. Classes that do not have their
    /// shape factor pinned to 1.
    pub fn uses_shape_factor(self) -> bool {
        matches!(self, Self::SuperEllipsoid | Self::CubeOctahedron)
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// A shape class with its shape-factor-dependent parameters resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeFunction {
    Ellipsoid,
    SuperEllipsoid { exponent: f64 },
    CubeOctahedron { truncation: f64 },
    Cylinder,
    Unknown,
}

impl ShapeFunction {
    pub fn resolve(class: ShapeClass, omega3: f64) -> Self {
        match class {
            ShapeClass::Ellipsoid => Self::Ellipsoid,
            ShapeClass::SuperEllipsoid => Self::SuperEllipsoid {
                exponent: superellipsoid_exponent(omega3),
            },
            ShapeClass::CubeOctahedron => Self::CubeOctahedron {
                truncation: 1.0 + 2.0 * omega3.clamp(0.0, 1.0),
            },
            ShapeClass::Cylinder => Self::Cylinder,
            ShapeClass::Unknown => Self::Unknown,
        }
    }

    /// Insideness at axis-normalized local coordinates.
    pub fn insideness(&self, u: &Vector3<f64>) -> f64 {
        match *self {
            Self::Ellipsoid => 1.0 - u.norm_squared(),
            Self::SuperEllipsoid { exponent } => {
                1.0 - (u.x.abs().powf(exponent) + u.y.abs().powf(exponent) + u.z.abs().powf(exponent))
            }
            Self::CubeOctahedron { truncation } => {
                let cube = 1.0 - u.abs().max();
                let octahedron = (truncation - u.abs().sum()) / truncation;
                cube.min(octahedron)
            }
            Self::Cylinder => {
                let along_axis = 1.0 - u.x.abs();
                let across_axis = 1.0 - (u.y * u.y + u.z * u.z);
                along_axis.min(across_axis)
            }
            Self::Unknown => -1.0,
        }
    }

    /// Volume enclosed by the shape when all three radii equal 1.
    pub fn unit_volume(&self) -> f64 {
        match *self {
            Self::Ellipsoid => 4.0 / 3.0 * PI,
            Self::SuperEllipsoid { exponent } => superball_volume(exponent),
            Self::CubeOctahedron { truncation } => truncated_cube_volume(truncation),
            Self::Cylinder => 2.0 * PI,
            Self::Unknown => 0.0,
        }
    }

    /// Primary radius `r1` giving `volume` for the axis ratios `b/a` and `c/a`.
    pub fn radius_for_volume(&self, volume: f64, b_over_a: f64, c_over_a: f64) -> f64 {
        let denominator = self.unit_volume() * b_over_a * c_over_a;
        if denominator <= 0.0 || volume <= 0.0 {
            return 0.0;
        }
        (volume / denominator).cbrt()
    }
}

/// A grain's shape placed in the sample frame: resolved shape function, radii and the
/// orientation matrix taking sample offsets into the local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainShape {
    function: ShapeFunction,
    radii: Vector3<f64>,
    to_local: Matrix3<f64>,
}

impl GrainShape {
    pub fn new(
        class: ShapeClass,
        volume: f64,
        axis_ratios: [f64; 2],
        omega3: f64,
        euler: [f64; 3],
    ) -> Self {
        let function = ShapeFunction::resolve(class, omega3);
        let r1 = function.radius_for_volume(volume, axis_ratios[0], axis_ratios[1]);
        Self {
            function,
            radii: Vector3::new(r1, r1 * axis_ratios[0], r1 * axis_ratios[1]),
            to_local: orientation_matrix(euler),
        }
    }

    /// The largest radius, used to size bounding boxes.
    pub fn primary_radius(&self) -> f64 {
        self.radii.x
    }

    /// Insideness of a point given by its offset from the grain centroid.
    pub fn insideness(&self, offset: &Vector3<f64>) -> f64 {
        if self.radii.min() <= 0.0 {
            return -1.0;
        }
        let local = self.to_local * offset;
        self.function.insideness(&local.component_div(&self.radii))
    }
}

/// Volume of the unit superball `|x|ⁿ + |y|ⁿ + |z|ⁿ ≤ 1`.
fn superball_volume(exponent: f64) -> f64 {
    (8f64.ln() + 3.0 * ln_gamma(1.0 + 1.0 / exponent) - ln_gamma(1.0 + 3.0 / exponent)).exp()
}

/// Moment invariant Ω3 of the unit superball; 1 for the sphere, decreasing towards the cube.
fn superball_omega3(exponent: f64) -> f64 {
    let n = exponent;
    let ln_volume = 8f64.ln() + 3.0 * ln_gamma(1.0 / n) - 3.0 * n.ln() - ln_gamma(1.0 + 3.0 / n);
    let ln_second_moment = 24f64.ln() + ln_gamma(3.0 / n) + 2.0 * ln_gamma(1.0 / n)
        - 3.0 * n.ln()
        - ln_gamma(1.0 + 5.0 / n);
    let sphere_norm = 0.6 * (3.0 / (4.0 * PI)).powf(2.0 / 3.0);
    sphere_norm * (5.0 / 3.0 * ln_volume - ln_second_moment).exp()
}

/// Solves Ω3(n) = `omega3` for the superellipsoid exponent by bisection.
pub fn superellipsoid_exponent(omega3: f64) -> f64 {
    let mut lo = MIN_SUPERELLIPSOID_EXPONENT;
    let mut hi = MAX_SUPERELLIPSOID_EXPONENT;
    if omega3 >= superball_omega3(lo) {
        return lo;
    }
    if omega3 <= superball_omega3(hi) {
        return hi;
    }
    for _ in 0..EXPONENT_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if superball_omega3(mid) > omega3 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Volume of `[-1, 1]³ ∩ { Σ|uᵢ| ≤ s }` for `s ∈ [1, 3]`.
fn truncated_cube_volume(s: f64) -> f64 {
    let s = s.clamp(1.0, 3.0);
    if s <= 2.0 {
        4.0 * s.powi(3) / 3.0 - 4.0 * (s - 1.0).powi(3)
    } else {
        8.0 - 4.0 * (3.0 - s).powi(3) / 3.0
    }
}
