use crate::core::orientation::{CrystalSymmetry, bins_per_axis};
use crate::core::shapes::ShapeClass;
use serde::Deserialize;
use thiserror::Error;

/// Parameters of a beta distribution.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BetaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaParams {
    /// A bin whose parameters cannot define a beta distribution.
    pub fn is_degenerate(&self) -> bool {
        !(self.alpha > 0.0 && self.beta > 0.0)
    }
}

/// Mean and standard deviation of a normally distributed logarithm.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LogNormalParams {
    pub mean: f64,
    pub stdev: f64,
}

/// Statistical description of one material phase.
///
/// All per-bin tables are indexed by diameter bin: bin `k` covers equivalent diameters in
/// `[min + k·step, min + (k+1)·step)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PhaseStatistics {
    /// Share of the packed volume this phase should occupy (normalized across phases).
    pub volume_fraction: f64,
    /// Log-normal model of the equivalent diameter.
    pub diameter: LogNormalParams,
    pub min_diameter: f64,
    pub max_diameter: f64,
    /// Width of a diameter bin.
    pub bin_step: f64,
    /// Per-bin beta parameters of the B/A axis ratio.
    pub b_over_a: Vec<BetaParams>,
    /// Per-bin beta parameters of the C/A axis ratio.
    pub c_over_a: Vec<BetaParams>,
    /// Per-bin beta parameters of the Ω3 shape factor.
    pub omega3: Vec<BetaParams>,
    /// Per-bin log-normal model of the neighbor count.
    pub neighbors: Vec<LogNormalParams>,
    /// Discretized axis orientation density over an `n³` Euler grid; empty means uniform.
    #[serde(default)]
    pub axis_odf: Vec<f64>,
}

impl PhaseStatistics {
    pub fn bin_count(&self) -> usize {
        self.b_over_a.len()
    }

    /// Diameter bin of `diameter`, clamped to the table range.
    pub fn diameter_bin(&self, diameter: f64) -> usize {
        let raw = ((diameter - self.min_diameter) / self.bin_step).max(0.0) as usize;
        raw.min(self.bin_count().saturating_sub(1))
    }

    fn validate(&self, phase: usize) -> Result<(), StatisticsError> {
        if !(self.volume_fraction >= 0.0 && self.volume_fraction.is_finite()) {
            return Err(StatisticsError::InvalidFraction {
                phase,
                fraction: self.volume_fraction,
            });
        }
        if !(self.min_diameter > 0.0 && self.max_diameter > self.min_diameter) {
            return Err(StatisticsError::InvalidDiameterRange {
                phase,
                min: self.min_diameter,
                max: self.max_diameter,
            });
        }
        if !(self.bin_step > 0.0) {
            return Err(StatisticsError::InvalidBinStep {
                phase,
                step: self.bin_step,
            });
        }
        if self.b_over_a.is_empty() {
            return Err(StatisticsError::EmptyTable {
                phase,
                table: "b-over-a",
            });
        }
        let expected = self.bin_count();
        let lengths = [
            ("c-over-a", self.c_over_a.len()),
            ("omega3", self.omega3.len()),
            ("neighbors", self.neighbors.len()),
        ];
        for (table, found) in lengths {
            if found != expected {
                return Err(StatisticsError::TableLength {
                    phase,
                    table,
                    expected,
                    found,
                });
            }
        }
        if !self.axis_odf.is_empty() && bins_per_axis(self.axis_odf.len()).is_none() {
            return Err(StatisticsError::InvalidOdf {
                phase,
                len: self.axis_odf.len(),
            });
        }
        Ok(())
    }
}

/// The broad role a phase plays in the microstructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseType {
    Primary,
    Precipitate,
    Matrix,
}

/// Statistics attached to a phase, tagged with the kind of phase they describe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StatsData {
    Primary(PhaseStatistics),
    Precipitate(PhaseStatistics),
    Matrix,
}

impl StatsData {
    fn kind(&self) -> &'static str {
        match self {
            Self::Primary(_) => "primary",
            Self::Precipitate(_) => "precipitate",
            Self::Matrix => "matrix",
        }
    }
}

/// One phase entry of a statistics set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PhaseEntry {
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    #[serde(default)]
    pub symmetry: CrystalSymmetry,
    #[serde(default)]
    pub shape: ShapeClass,
    #[serde(default)]
    pub statistics: Option<StatsData>,
}

/// The statistics of every phase, in phase-id order (the first entry is phase 1).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatisticsSet {
    pub phases: Vec<PhaseEntry>,
}

/// A validated primary phase with its normalized volume fraction.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryPhase<'a> {
    pub id: usize,
    pub fraction: f64,
    pub shape: ShapeClass,
    pub symmetry: CrystalSymmetry,
    pub stats: &'a PhaseStatistics,
}

#[derive(Debug, Error, PartialEq)]
pub enum StatisticsError {
    #[error("No primary phase is defined")]
    NoPrimaryPhase,
    #[error("Phase {phase} is a primary phase but carries no statistics")]
    MissingStatistics { phase: usize },
    #[error("Phase {phase} requires {expected} statistics but found {found} statistics")]
    WrongKind {
        phase: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Phase {phase} uses a shape class that cannot be packed")]
    UnsupportedShape { phase: usize },
    #[error("Phase {phase} has an invalid volume fraction {fraction}")]
    InvalidFraction { phase: usize, fraction: f64 },
    #[error("Primary phase volume fractions sum to zero")]
    ZeroTotalFraction,
    #[error("Phase {phase} has an invalid diameter range [{min}, {max}]")]
    InvalidDiameterRange { phase: usize, min: f64, max: f64 },
    #[error("Phase {phase} has a non-positive diameter bin step {step}")]
    InvalidBinStep { phase: usize, step: f64 },
    #[error("Phase {phase} has an empty '{table}' table")]
    EmptyTable { phase: usize, table: &'static str },
    #[error("Phase {phase} table '{table}' has {found} bins but {expected} were expected")]
    TableLength {
        phase: usize,
        table: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Phase {phase} orientation table has {len} entries, which is not a cubic grid")]
    InvalidOdf { phase: usize, len: usize },
}

impl StatisticsSet {
    /// Validates the primary phases and returns them with normalized volume fractions.
    pub fn primary_phases(&self) -> Result<Vec<PrimaryPhase<'_>>, StatisticsError> {
        let mut primaries = Vec::new();
        for (index, entry) in self.phases.iter().enumerate() {
            if entry.phase_type != PhaseType::Primary {
                continue;
            }
            let id = index + 1;
            let stats = match &entry.statistics {
                None => return Err(StatisticsError::MissingStatistics { phase: id }),
                Some(StatsData::Primary(stats)) => stats,
                Some(other) => {
                    return Err(StatisticsError::WrongKind {
                        phase: id,
                        expected: "primary",
                        found: other.kind(),
                    });
                }
            };
            if !entry.shape.is_known() {
                return Err(StatisticsError::UnsupportedShape { phase: id });
            }
            stats.validate(id)?;
            primaries.push(PrimaryPhase {
                id,
                fraction: stats.volume_fraction,
                shape: entry.shape,
                symmetry: entry.symmetry,
                stats,
            });
        }

        if primaries.is_empty() {
            return Err(StatisticsError::NoPrimaryPhase);
        }
        let total: f64 = primaries.iter().map(|p| p.fraction).sum();
        if total <= 0.0 {
            return Err(StatisticsError::ZeroTotalFraction);
        }
        for p in &mut primaries {
            p.fraction /= total;
        }
        Ok(primaries)
    }
}
