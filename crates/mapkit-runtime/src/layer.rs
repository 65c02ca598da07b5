//! Marker layers.
//!
//! A layer is built in two steps:
//!
//! 1. [`LayerControllerBuilder`] is created and registered immediately,
//!    holding a pending [`ReadinessCell`].
//! 2. Once the engine is ready, [`LayerControllerBuilder::build`] creates
//!    the marker manager and resolves the cell with a [`LayerController`].
//!
//! Nothing is exposed between the two steps.

use crate::config::ClusteringPolicy;
use crate::engine::{MapHandle, MarkerManager, RenderContext};
use crate::error::MapError;
use crate::readiness::ReadinessCell;
use mapkit_types::MarkerSpec;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Marker operations for one built layer.
pub struct LayerController {
    layer_id: Option<String>,
    clustering: bool,
    manager: Mutex<Box<dyn MarkerManager>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for LayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerController")
            .field("layer_id", &self.layer_id)
            .field("clustering", &self.clustering)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl LayerController {
    #[must_use]
    pub fn new(
        layer_id: Option<String>,
        clustering: bool,
        manager: Box<dyn MarkerManager>,
    ) -> Self {
        Self {
            layer_id,
            clustering,
            manager: Mutex::new(manager),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn layer_id(&self) -> Option<&str> {
        self.layer_id.as_deref()
    }

    #[must_use]
    pub fn is_clustering(&self) -> bool {
        self.clustering
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Releases the marker manager. Later calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.manager.lock().close();
        info!(layer_id = ?self.layer_id, "layer closed");
    }

    fn ensure_open(&self) -> Result<(), MapError> {
        if self.is_closed() {
            return Err(MapError::LayerClosed(self.layer_id.clone()));
        }
        Ok(())
    }

    pub fn add_marker(&self, marker: MarkerSpec) -> Result<(), MapError> {
        self.ensure_open()?;
        debug!(layer_id = ?self.layer_id, marker_id = %marker.id, "add marker");
        self.manager.lock().add(marker)?;
        Ok(())
    }

    pub fn add_markers(&self, markers: Vec<MarkerSpec>) -> Result<(), MapError> {
        self.ensure_open()?;
        debug!(layer_id = ?self.layer_id, count = markers.len(), "add markers");
        self.manager.lock().add_all(markers)?;
        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<MarkerSpec>, MapError> {
        self.ensure_open()?;
        Ok(self.manager.lock().all())
    }

    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if no marker has this id.
    pub fn get_by_id(&self, marker_id: &str) -> Result<MarkerSpec, MapError> {
        self.ensure_open()?;
        self.manager
            .lock()
            .get(marker_id)
            .ok_or_else(|| MapError::MarkerNotFound(marker_id.to_string()))
    }

    pub fn remove_all(&self) -> Result<(), MapError> {
        self.ensure_open()?;
        self.manager.lock().remove_all();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if no marker has this id.
    pub fn remove_by_id(&self, marker_id: &str) -> Result<(), MapError> {
        self.ensure_open()?;
        if self.manager.lock().remove(marker_id) {
            Ok(())
        } else {
            Err(MapError::MarkerNotFound(marker_id.to_string()))
        }
    }

    /// Replaces the marker stored under `marker_id` with `marker`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if no marker has this id.
    pub fn update(&self, marker_id: &str, marker: MarkerSpec) -> Result<(), MapError> {
        self.ensure_open()?;
        if self.manager.lock().update(marker_id, marker)? {
            Ok(())
        } else {
            Err(MapError::MarkerNotFound(marker_id.to_string()))
        }
    }
}

/// Deferred builder for one layer; this is what the registry stores.
#[derive(Debug)]
pub struct LayerControllerBuilder {
    layer_id: Option<String>,
    clustering: bool,
    controller: ReadinessCell<Arc<LayerController>>,
    failure: Mutex<Option<MapError>>,
}

impl LayerControllerBuilder {
    #[must_use]
    pub fn new(layer_id: Option<String>, clustering: bool) -> Self {
        Self {
            layer_id,
            clustering,
            controller: ReadinessCell::new(),
            failure: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn layer_id(&self) -> Option<&str> {
        self.layer_id.as_deref()
    }

    #[must_use]
    pub fn is_clustering(&self) -> bool {
        self.clustering
    }

    /// True if this layer answers to `layer_id` (`None` matches `None`).
    #[must_use]
    pub fn matches(&self, layer_id: Option<&str>) -> bool {
        self.layer_id.as_deref() == layer_id
    }

    /// The controller future. Resolved by [`build`](Self::build).
    #[must_use]
    pub fn controller(&self) -> ReadinessCell<Arc<LayerController>> {
        self.controller.clone()
    }

    /// The error recorded by a failed build, if any.
    #[must_use]
    pub fn failure(&self) -> Option<MapError> {
        self.failure.lock().clone()
    }

    /// Creates the marker manager and resolves the controller cell.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the manager cannot be created. The cell
    /// then stays pending and the error is kept for [`failure`](Self::failure).
    pub fn build(
        &self,
        map: &MapHandle,
        render: &RenderContext,
        policy: ClusteringPolicy,
    ) -> Result<(), MapError> {
        let manager = if self.clustering {
            render.factory.create_with_clustering(
                map,
                policy,
                Arc::clone(&render.cluster_renderer),
            )
        } else {
            render.factory.create(map)
        };

        let manager = match manager {
            Ok(manager) => manager,
            Err(e) => {
                let err = MapError::from(e);
                error!(layer_id = ?self.layer_id, error = %err, "layer build failed");
                *self.failure.lock() = Some(err.clone());
                return Err(err);
            }
        };

        let controller = LayerController::new(self.layer_id.clone(), self.clustering, manager);
        self.controller.resolve(Arc::new(controller))?;
        info!(layer_id = ?self.layer_id, clustering = self.clustering, "layer ready");
        Ok(())
    }

    /// Closes the controller now, or as soon as it is built.
    pub fn close(&self) {
        self.controller.on_ready(|controller| controller.close());
    }
}
