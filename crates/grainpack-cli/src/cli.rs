use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "grainpack developers",
    version,
    about = "grainpack CLI - Synthesize voxelized polycrystalline microstructures from per-phase grain statistics.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of threads used to rasterize grains.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pack grains matching a statistics file into a voxel domain and write it as VTK.
    Pack(PackArgs),
}

/// Arguments for the `pack` subcommand.
#[derive(Args, Debug)]
pub struct PackArgs {
    // --- Core Arguments ---
    /// Path to the phase statistics file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub statistics: PathBuf,

    /// Path for the output VTK file with FeatureIds and Phases arrays.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Domain Overrides ---
    /// Number of voxels along x, y and z.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub dims: Option<Vec<usize>>,

    /// Edge length of one voxel along x, y and z.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub resolution: Option<Vec<f64>>,

    /// Override `domain.periodic` from the config file.
    #[command(flatten)]
    pub periodic: PeriodicFlags,

    // --- Packing Overrides ---
    /// Seed of the random number generator.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Refinement moves per grain.
    #[arg(long, value_name = "INT")]
    pub moves_per_grain: Option<usize>,

    /// Skip removal of detached grain fragments and undersized grains.
    #[arg(long)]
    pub no_cleanup: bool,

    // --- Output Overrides ---
    /// Write per-grain attributes as CSV to this path.
    #[arg(long, value_name = "PATH")]
    pub goal_attributes: Option<PathBuf>,

    /// Write the packing grid occupancy as VTK to this path.
    #[arg(long, value_name = "PATH")]
    pub packing_dump: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S packing.seed=42
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags for periodic boundaries.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct PeriodicFlags {
    /// Wrap grains around the domain faces.
    #[arg(long)]
    pub periodic: bool,
    /// Clip grains at the domain faces.
    #[arg(long)]
    pub no_periodic: bool,
}
