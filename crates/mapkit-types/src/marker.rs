//! Marker descriptions exchanged with the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A marker as sent by the host.
///
/// `user_data` is opaque to this crate and is returned unchanged by
/// `markers#getById`. Any field not listed here (icon, z-index, anchor)
/// is kept in `style` and handed to the engine as is.
///
/// ```
/// use mapkit_types::MarkerSpec;
/// use serde_json::json;
///
/// let marker: MarkerSpec = serde_json::from_value(json!({
///     "id": "cafe-1",
///     "position": {"lat": 55.75, "lng": 37.61},
///     "userData": {"rating": 5},
///     "icon": "cafe.png",
/// })).unwrap();
///
/// assert_eq!(marker.id, "cafe-1");
/// assert_eq!(marker.user_data, json!({"rating": 5}));
/// assert_eq!(marker.style["icon"], json!("cafe.png"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSpec {
    pub id: String,
    pub position: GeoPoint,
    #[serde(default)]
    pub user_data: Value,
    #[serde(flatten)]
    pub style: Map<String, Value>,
}

impl MarkerSpec {
    /// Creates a marker with no user data and no style.
    #[must_use]
    pub fn new(id: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            id: id.into(),
            position,
            user_data: Value::Null,
            style: Map::new(),
        }
    }

    /// Sets the opaque user payload.
    #[must_use]
    pub fn with_user_data(mut self, user_data: Value) -> Self {
        self.user_data = user_data;
        self
    }
}
