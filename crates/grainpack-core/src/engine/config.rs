use crate::core::models::domain::Domain;
use nalgebra::Vector3;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MOVES_PER_GRAIN: usize = 100;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Files written by the packing workflow itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    pub write_goal_attributes: bool,
    pub goal_attributes_path: Option<PathBuf>,
    /// Coarse packing-grid snapshot written after refinement.
    pub packing_dump_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackingConfig {
    /// Voxels along x, y and z.
    pub dims: [usize; 3],
    /// Physical voxel edge length along each axis.
    pub resolution: Vector3<f64>,
    pub periodic: bool,
    pub seed: u64,
    /// Refinement runs `moves_per_grain × (grains − 1)` moves.
    pub moves_per_grain: usize,
    pub cleanup: bool,
    pub output: OutputConfig,
}

impl PackingConfig {
    pub fn domain(&self) -> Domain {
        Domain::new(self.dims, self.resolution, self.periodic)
    }
}

#[derive(Default)]
pub struct PackingConfigBuilder {
    dims: Option<[usize; 3]>,
    resolution: Option<Vector3<f64>>,
    periodic: Option<bool>,
    seed: Option<u64>,
    moves_per_grain: Option<usize>,
    cleanup: Option<bool>,
    write_goal_attributes: Option<bool>,
    goal_attributes_path: Option<PathBuf>,
    packing_dump_path: Option<PathBuf>,
}

impl PackingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dims(mut self, dims: [usize; 3]) -> Self {
        self.dims = Some(dims);
        self
    }
    pub fn resolution(mut self, resolution: [f64; 3]) -> Self {
        self.resolution = Some(Vector3::from(resolution));
        self
    }
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = Some(periodic);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn moves_per_grain(mut self, moves: usize) -> Self {
        self.moves_per_grain = Some(moves);
        self
    }
    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = Some(enabled);
        self
    }
    pub fn write_goal_attributes(mut self, enabled: bool) -> Self {
        self.write_goal_attributes = Some(enabled);
        self
    }
    pub fn goal_attributes_path(mut self, path: PathBuf) -> Self {
        self.goal_attributes_path = Some(path);
        self
    }
    pub fn packing_dump_path(mut self, path: PathBuf) -> Self {
        self.packing_dump_path = Some(path);
        self
    }

    pub fn build(self) -> Result<PackingConfig, ConfigError> {
        let dims = self.dims.ok_or(ConfigError::MissingParameter("dims"))?;
        let resolution = self
            .resolution
            .ok_or(ConfigError::MissingParameter("resolution"))?;
        if resolution.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(ConfigError::InvalidParameter {
                name: "resolution",
                reason: format!(
                    "every axis must be positive, got ({}, {}, {})",
                    resolution.x, resolution.y, resolution.z
                ),
            });
        }
        let seed = self.seed.ok_or(ConfigError::MissingParameter("seed"))?;

        let write_goal_attributes = self.write_goal_attributes.unwrap_or(false);
        if write_goal_attributes && self.goal_attributes_path.is_none() {
            return Err(ConfigError::MissingParameter("goal_attributes_path"));
        }

        Ok(PackingConfig {
            dims,
            resolution,
            periodic: self.periodic.unwrap_or(false),
            seed,
            moves_per_grain: self.moves_per_grain.unwrap_or(DEFAULT_MOVES_PER_GRAIN),
            cleanup: self.cleanup.unwrap_or(true),
            output: OutputConfig {
                write_goal_attributes,
                goal_attributes_path: self.goal_attributes_path,
                packing_dump_path: self.packing_dump_path,
            },
        })
    }
}
