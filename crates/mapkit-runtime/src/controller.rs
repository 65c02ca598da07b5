//! Top-level map controller.
//!
//! Owns the engine readiness cell, the layer registry and the camera
//! builder for one map instance.
//!
//! ```text
//! engine.get_ready(cb) ──► engine cell ──on_ready──► CameraControllerBuilder::build
//!                               │
//!                               ├──on_ready──► LayerControllerBuilder::build (layer 1)
//!                               └──on_ready──► LayerControllerBuilder::build (layer N)
//! ```
//!
//! Layers can be added before or after the engine is ready; both go
//! through the same `on_ready` path.

use crate::camera::{CameraController, CameraControllerBuilder};
use crate::config::MapConfig;
use crate::engine::{MapEngine, MapHandle, RenderContext};
use crate::error::MapError;
use crate::layer::{LayerController, LayerControllerBuilder};
use crate::readiness::ReadinessCell;
use crate::registry::LayerRegistry;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Controller for one embedded map.
pub struct MapController {
    config: MapConfig,
    render: RenderContext,
    engine: ReadinessCell<MapHandle>,
    layers: LayerRegistry,
    camera: Arc<CameraControllerBuilder>,
}

impl std::fmt::Debug for MapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapController")
            .field("ready", &self.is_ready())
            .field("layers", &self.layers.layer_ids())
            .finish_non_exhaustive()
    }
}

impl MapController {
    /// Creates the controller and asks `engine` for readiness.
    ///
    /// Layers declared in `config` are registered before the readiness
    /// callback is installed, so they are built first.
    pub fn new(config: MapConfig, engine: &dyn MapEngine, render: RenderContext) -> Self {
        let controller = Self {
            config,
            render,
            engine: ReadinessCell::new(),
            layers: LayerRegistry::new(),
            camera: Arc::new(CameraControllerBuilder::new()),
        };

        let camera = Arc::clone(&controller.camera);
        let initial = controller.config.initial_camera_position;
        controller.engine.on_ready(move |map| {
            let _ = camera.build(&map, initial.as_ref());
        });

        for layer in &controller.config.layers {
            let builder = controller.schedule_layer(layer.layer_id.clone(), layer.clustering);
            controller.layers.add(builder);
        }

        let cell = controller.engine.clone();
        engine.get_ready(Box::new(move |map| {
            info!("map engine ready");
            if let Err(e) = cell.resolve(map) {
                error!(error = %e, "engine readiness delivered twice");
            }
        }));

        controller
    }

    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// True once the engine has delivered the map.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Registers a layer and schedules its build for engine readiness.
    ///
    /// Returns immediately; it never waits for the engine.
    ///
    /// # Errors
    ///
    /// If the engine is already ready and the build fails, returns the
    /// build error and leaves the registry unchanged.
    pub fn add_layer(&self, layer_id: Option<String>, clustering: bool) -> Result<(), MapError> {
        let builder = self.schedule_layer(layer_id, clustering);
        if let Some(err) = builder.failure() {
            return Err(err);
        }

        info!(layer_id = ?builder.layer_id(), clustering, "layer added");
        self.layers.add(builder);
        Ok(())
    }

    fn schedule_layer(
        &self,
        layer_id: Option<String>,
        clustering: bool,
    ) -> Arc<LayerControllerBuilder> {
        let builder = Arc::new(LayerControllerBuilder::new(layer_id, clustering));
        let pending = Arc::clone(&builder);
        let render = self.render.clone();
        let policy = self.config.clustering;
        self.engine.on_ready(move |map| {
            let _ = pending.build(&map, &render, policy);
        });
        builder
    }

    /// Removes the first layer matching `layer_id` and closes it, now or
    /// once it is built. Returns false if nothing matched.
    pub fn remove_layer(&self, layer_id: Option<&str>) -> bool {
        match self.layers.remove(layer_id) {
            Some(builder) => {
                builder.close();
                info!(?layer_id, "layer removed");
                true
            }
            None => {
                debug!(?layer_id, "remove of unknown layer ignored");
                false
            }
        }
    }

    /// The controller future of the first layer matching `layer_id`.
    ///
    /// # Errors
    ///
    /// - [`MapError::LayerNotFound`] if no layer matches
    /// - the recorded build error if the layer failed to build
    pub fn get_layer(
        &self,
        layer_id: Option<&str>,
    ) -> Result<ReadinessCell<Arc<LayerController>>, MapError> {
        let builder = self.layers.get(layer_id)?;
        if let Some(err) = builder.failure() {
            return Err(err);
        }
        Ok(builder.controller())
    }

    /// The camera controller future.
    ///
    /// # Errors
    ///
    /// Returns the recorded build error if the camera failed to build.
    pub fn camera(&self) -> Result<ReadinessCell<Arc<CameraController>>, MapError> {
        if let Some(err) = self.camera.failure() {
            return Err(err);
        }
        Ok(self.camera.controller())
    }

    /// Layer identifiers in registration order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<Option<String>> {
        self.layers.layer_ids()
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Removes and closes every layer.
    pub fn dispose(&self) {
        let removed = self.layers.drain();
        for builder in &removed {
            builder.close();
        }
        info!(count = removed.len(), "map controller disposed");
    }
}
