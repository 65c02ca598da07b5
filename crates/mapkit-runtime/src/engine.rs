//! Collaborator interfaces for the embedded map engine.
//!
//! The rendering engine is opaque. The controller only touches it through
//! these traits:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`MapEngine`] | Delivers the [`Map`] once, asynchronously |
//! | [`Map`] | The ready map; hands out its camera |
//! | [`ObjectManagerFactory`] | Plain and clustering marker managers |
//! | [`MarkerManager`] | Marker CRUD for one layer |
//! | [`ClusterRenderer`] | Styles an aggregated cluster |
//! | [`Camera`] | Moves the camera |
//!
//! Implementations are expected to be internally synchronized; the
//! controller may call them from the engine's callback thread.

use crate::config::ClusteringPolicy;
use crate::error::EngineError;
use mapkit_types::MarkerSpec;
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;

/// Handle to the ready map instance.
pub type MapHandle = Arc<dyn Map>;

/// Callback the engine invokes once the map is usable.
pub type ReadyCallback = Box<dyn FnOnce(MapHandle) + Send + 'static>;

/// The engine as seen before readiness.
pub trait MapEngine: Send + Sync {
    /// Registers the readiness callback. Invoked at most once, possibly on
    /// another thread and possibly before this method returns.
    fn get_ready(&self, callback: ReadyCallback);
}

/// A ready map.
pub trait Map: Send + Sync {
    /// Returns the camera capability of this map.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine cannot expose its camera.
    fn camera(&self) -> Result<Arc<dyn Camera>, EngineError>;
}

/// Camera capability.
pub trait Camera: Send + Sync {
    /// Moves the camera. `spec` is the host's argument map, unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Camera`] if the spec cannot be applied.
    fn move_camera(&self, spec: &JsonMap<String, Value>) -> Result<(), EngineError>;
}

/// Styles clusters produced by a clustering marker manager.
pub trait ClusterRenderer: Send + Sync {
    /// Returns the style payload for a cluster of `members`.
    fn render_cluster(&self, members: &[MarkerSpec]) -> Value;
}

/// Builds marker managers bound to a ready map.
pub trait ObjectManagerFactory: Send + Sync {
    /// Creates a manager that draws every marker individually.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine rejects the request.
    fn create(&self, map: &MapHandle) -> Result<Box<dyn MarkerManager>, EngineError>;

    /// Creates a manager that aggregates nearby markers.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine rejects the request.
    fn create_with_clustering(
        &self,
        map: &MapHandle,
        policy: ClusteringPolicy,
        renderer: Arc<dyn ClusterRenderer>,
    ) -> Result<Box<dyn MarkerManager>, EngineError>;
}

/// Marker storage and drawing for one layer.
pub trait MarkerManager: Send {
    fn add(&mut self, marker: MarkerSpec) -> Result<(), EngineError>;

    fn add_all(&mut self, markers: Vec<MarkerSpec>) -> Result<(), EngineError> {
        for marker in markers {
            self.add(marker)?;
        }
        Ok(())
    }

    fn all(&self) -> Vec<MarkerSpec>;

    fn get(&self, id: &str) -> Option<MarkerSpec>;

    /// Removes a marker. Returns false if `id` was not present.
    fn remove(&mut self, id: &str) -> bool;

    fn remove_all(&mut self);

    /// Replaces a marker. Returns false if `id` was not present.
    fn update(&mut self, id: &str, marker: MarkerSpec) -> Result<bool, EngineError>;

    /// Releases engine resources. Called exactly once.
    fn close(&mut self);
}

/// What a layer build needs besides the map itself.
#[derive(Clone)]
pub struct RenderContext {
    pub factory: Arc<dyn ObjectManagerFactory>,
    pub cluster_renderer: Arc<dyn ClusterRenderer>,
}

impl RenderContext {
    #[must_use]
    pub fn new(
        factory: Arc<dyn ObjectManagerFactory>,
        cluster_renderer: Arc<dyn ClusterRenderer>,
    ) -> Self {
        Self {
            factory,
            cluster_renderer,
        }
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext").finish_non_exhaustive()
    }
}
