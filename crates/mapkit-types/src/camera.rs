//! Camera position descriptions.

use crate::GeoPoint;
use serde::{Deserialize, Serialize};

/// Where the camera looks.
///
/// Used for the initial position in configuration. `camera#move` calls
/// pass their argument map through untouched, so hosts may send fields
/// this struct does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPosition {
    pub point: GeoPoint,
    pub zoom: f32,
    #[serde(default)]
    pub tilt: f32,
    #[serde(default)]
    pub bearing: f32,
}

impl CameraPosition {
    /// Looks straight down at `point`.
    #[must_use]
    pub fn new(point: GeoPoint, zoom: f32) -> Self {
        Self {
            point,
            zoom,
            tilt: 0.0,
            bearing: 0.0,
        }
    }
}
