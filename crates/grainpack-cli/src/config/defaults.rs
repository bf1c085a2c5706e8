use grainpack::engine::config::DEFAULT_MOVES_PER_GRAIN;

/// Values used when neither the config file nor the command line sets them.
pub struct DefaultsConfig {
    pub dims: [usize; 3],
    pub resolution: [f64; 3],
    pub periodic: bool,
    pub seed: u64,
    pub moves_per_grain: usize,
    pub cleanup: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dims: [128, 128, 128],
            resolution: [1.0, 1.0, 1.0],
            periodic: false,
            seed: 5489,
            moves_per_grain: DEFAULT_MOVES_PER_GRAIN,
            cleanup: true,
        }
    }
}
