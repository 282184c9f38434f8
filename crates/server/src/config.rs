use shared_types::{AppConfig, FeatureFlags};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the working directory.
const CONFIG_PATH: &str = "config.toml";

/// Parse a config file, falling back to defaults if it is missing or invalid.
///
/// Runs before logging is installed, so problems go to stderr.
pub fn read_config(path: impl AsRef<Path>) -> AppConfig {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            eprintln!("[config] Failed to parse {}: {e}; using defaults", path.display());
            AppConfig::default()
        }),
        Err(e) => {
            eprintln!("[config] {} not found ({e}); using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Read `config.toml` once and keep it for the life of the process.
/// Later calls return the first result.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| read_config(CONFIG_PATH))
}

/// The loaded config, or defaults if `load_config()` hasn't run.
pub fn config() -> &'static AppConfig {
    static DEFAULT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(AppConfig::default))
}

pub fn feature_flags() -> &'static FeatureFlags {
    &config().features
}

/// Deadline for one analysis run, if configured.
pub fn analysis_deadline(config: &AppConfig) -> Option<Duration> {
    config.analysis.timeout_secs.map(Duration::from_secs)
}
