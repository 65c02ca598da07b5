//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use mapkit_types::CameraPosition;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller configuration.
///
/// # Example
///
/// ```
/// use mapkit_runtime::config::MapConfig;
///
/// let config = MapConfig::default();
/// assert!(config.layers.is_empty());
/// assert_eq!(config.clustering.pixel_radius, 80.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Applied once, when the camera controller is built.
    pub initial_camera_position: Option<CameraPosition>,

    /// Layers registered at construction, in order.
    pub layers: Vec<LayerConfig>,

    /// Thresholds for clustering layers.
    pub clustering: ClusteringPolicy,

    pub timeouts: TimeoutsConfig,
}

impl MapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// A layer declared up front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// `None` declares the default layer.
    pub layer_id: Option<String>,
    pub clustering: bool,
}

/// When nearby markers are aggregated into a cluster.
///
/// Markers closer than `pixel_radius` logical pixels merge; clusters
/// dissolve at `max_zoom` and above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringPolicy {
    pub pixel_radius: f32,
    pub max_zoom: f32,
}

impl Default for ClusteringPolicy {
    fn default() -> Self {
        Self {
            pixel_radius: 80.0,
            max_zoom: 18.0,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Upper bound a command waits for its target to become ready.
    pub ready_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self { ready_ms: 30_000 }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub fn ready(&self) -> Duration {
        Duration::from_millis(self.ready_ms)
    }
}
