use grainpack::engine::config::PackingConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub statistics_path: PathBuf,
    pub output_path: PathBuf,
    pub core_config: PackingConfig,
}
