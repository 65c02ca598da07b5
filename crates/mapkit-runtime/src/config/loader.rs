//! Configuration loader.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file, if one was given
//! 3. Environment variables (`MAPKIT_*`)
//!
//! Each layer overrides the previous.

use super::{ConfigError, MapConfig};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Parses `$var` with [`FromStr`] into `$field` when the lookup yields a value.
macro_rules! parse_env_num {
    ($lookup:expr, $field:expr, $var:literal) => {
        if let Some(val) = $lookup($var) {
            $field = parse_num(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected number"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```ignore
/// use mapkit_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_file("/etc/mapkit.toml")
///     .skip_env_vars()
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TOML file to load. The file must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// environment variable holds an unparsable value.
    pub fn load(&self) -> Result<MapConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => {
                let config = load_file(path)?;
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            None => MapConfig::default(),
        };

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<MapConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    MapConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Applies `MAPKIT_*` overrides read through `lookup`.
fn apply_env<F>(config: &mut MapConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_env_num!(lookup, config.timeouts.ready_ms, "MAPKIT_READY_TIMEOUT_MS");
    parse_env_num!(
        lookup,
        config.clustering.pixel_radius,
        "MAPKIT_CLUSTER_PIXEL_RADIUS"
    );
    parse_env_num!(lookup, config.clustering.max_zoom, "MAPKIT_CLUSTER_MAX_ZOOM");
    Ok(())
}

fn parse_num<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}
