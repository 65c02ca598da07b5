//! Controller configuration.
//!
//! # Load Order
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. Environment Variables (MAPKIT_*)    │  Runtime override
//! ├─────────────────────────────────────────┤
//! │  2. Config file (TOML)                  │  Host-provided
//! ├─────────────────────────────────────────┤
//! │  3. Default Values (compile-time)       │  Fallback
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `MAPKIT_READY_TIMEOUT_MS` | `timeouts.ready_ms` | u64 |
//! | `MAPKIT_CLUSTER_PIXEL_RADIUS` | `clustering.pixel_radius` | f32 |
//! | `MAPKIT_CLUSTER_MAX_ZOOM` | `clustering.max_zoom` | f32 |
//!
//! # Example Configuration
//!
//! ```toml
//! [initial_camera_position]
//! point = { lat = 55.75, lng = 37.61 }
//! zoom = 12.0
//!
//! [[layers]]
//! layer_id = "poi"
//! clustering = true
//!
//! [clustering]
//! pixel_radius = 80.0
//! max_zoom = 18.0
//!
//! [timeouts]
//! ready_ms = 30000
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{ClusteringPolicy, LayerConfig, MapConfig, TimeoutsConfig};
