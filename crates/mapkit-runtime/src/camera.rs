//! Camera controller.
//!
//! Same deferred pattern as [`crate::layer`], but a single instance per
//! map. The initial position from configuration is applied once, when the
//! controller is built.

use crate::engine::{Camera, MapHandle};
use crate::error::{EngineError, MapError};
use crate::readiness::ReadinessCell;
use mapkit_types::CameraPosition;
use parking_lot::Mutex;
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Camera operations on a ready map.
pub struct CameraController {
    camera: Arc<dyn Camera>,
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController").finish_non_exhaustive()
    }
}

impl CameraController {
    #[must_use]
    pub fn new(camera: Arc<dyn Camera>) -> Self {
        Self { camera }
    }

    /// Moves the camera with the host's argument map.
    pub fn move_camera(&self, spec: &JsonMap<String, Value>) -> Result<(), MapError> {
        self.camera.move_camera(spec)?;
        Ok(())
    }

    /// Moves the camera to a typed position.
    pub fn move_to(&self, position: &CameraPosition) -> Result<(), MapError> {
        match serde_json::to_value(position) {
            Ok(Value::Object(spec)) => self.move_camera(&spec),
            Ok(_) | Err(_) => Err(EngineError::Camera("unserializable position".into()).into()),
        }
    }
}

/// Deferred builder for the map's camera controller.
#[derive(Debug, Default)]
pub struct CameraControllerBuilder {
    controller: ReadinessCell<Arc<CameraController>>,
    failure: Mutex<Option<MapError>>,
}

impl CameraControllerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn controller(&self) -> ReadinessCell<Arc<CameraController>> {
        self.controller.clone()
    }

    #[must_use]
    pub fn failure(&self) -> Option<MapError> {
        self.failure.lock().clone()
    }

    /// Obtains the camera, applies `initial` and resolves the controller.
    ///
    /// A failure to apply the initial position is logged and does not
    /// prevent the controller from becoming ready.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the map has no usable camera.
    pub fn build(
        &self,
        map: &MapHandle,
        initial: Option<&CameraPosition>,
    ) -> Result<(), MapError> {
        let camera = match map.camera() {
            Ok(camera) => camera,
            Err(e) => {
                let err = MapError::from(e);
                error!(error = %err, "camera build failed");
                *self.failure.lock() = Some(err.clone());
                return Err(err);
            }
        };

        let controller = CameraController::new(camera);
        if let Some(position) = initial {
            if let Err(e) = controller.move_to(position) {
                warn!(error = %e, "initial camera position rejected");
            }
        }

        self.controller.resolve(Arc::new(controller))?;
        info!("camera ready");
        Ok(())
    }
}
