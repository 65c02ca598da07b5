//! In-memory engine.
//!
//! Implements every collaborator trait in [`crate::engine`] without a
//! renderer. The CLI replays scripts against it and the tests use it to
//! control exactly when readiness fires.
//!
//! ```
//! use mapkit_runtime::memory::InMemoryEngine;
//! use mapkit_runtime::MapEngine;
//! use std::sync::{Arc, Mutex};
//!
//! let engine = InMemoryEngine::new();
//! let seen = Arc::new(Mutex::new(false));
//! let flag = Arc::clone(&seen);
//! engine.get_ready(Box::new(move |_map| *flag.lock().unwrap() = true));
//!
//! assert!(!*seen.lock().unwrap());
//! engine.fire_ready();
//! assert!(*seen.lock().unwrap());
//! ```

use crate::config::ClusteringPolicy;
use crate::engine::{
    Camera, ClusterRenderer, Map, MapEngine, MapHandle, MarkerManager, ObjectManagerFactory,
    ReadyCallback,
};
use crate::error::EngineError;
use mapkit_types::MarkerSpec;
use parking_lot::Mutex;
use serde_json::{json, Map as JsonMap, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum EngineState {
    Idle,
    Waiting(ReadyCallback),
    /// Fired before anyone asked; the next `get_ready` gets the map at once.
    Fired,
    Done,
}

/// Engine whose readiness is triggered by hand.
pub struct InMemoryEngine {
    map: Arc<InMemoryMap>,
    state: Mutex<EngineState>,
}

impl InMemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_map(Arc::new(InMemoryMap::new()))
    }

    #[must_use]
    pub fn with_map(map: Arc<InMemoryMap>) -> Self {
        Self {
            map,
            state: Mutex::new(EngineState::Idle),
        }
    }

    /// The map handed to the readiness callback.
    #[must_use]
    pub fn map(&self) -> Arc<InMemoryMap> {
        Arc::clone(&self.map)
    }

    /// Delivers readiness on the calling thread. Only the first call has
    /// an effect.
    pub fn fire_ready(&self) {
        let callback = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, EngineState::Done) {
                EngineState::Waiting(callback) => callback,
                EngineState::Idle => {
                    *state = EngineState::Fired;
                    return;
                }
                other => {
                    *state = other;
                    return;
                }
            }
        };
        let map: MapHandle = self.map.clone();
        callback(map);
    }

    /// Delivers readiness from a separate thread after `delay`.
    pub fn fire_ready_after(self: &Arc<Self>, delay: Duration) -> std::thread::JoinHandle<()> {
        let engine = Arc::clone(self);
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            engine.fire_ready();
        })
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEngine for InMemoryEngine {
    fn get_ready(&self, callback: ReadyCallback) {
        {
            let mut state = self.state.lock();
            match &*state {
                EngineState::Idle => {
                    *state = EngineState::Waiting(callback);
                    return;
                }
                EngineState::Fired => *state = EngineState::Done,
                EngineState::Waiting(_) | EngineState::Done => return,
            }
        }
        let map: MapHandle = self.map.clone();
        callback(map);
    }
}

/// Ready map with a recording camera.
#[derive(Default)]
pub struct InMemoryMap {
    camera: Arc<RecordingCamera>,
    camera_error: Mutex<Option<String>>,
}

impl InMemoryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recording_camera(&self) -> Arc<RecordingCamera> {
        Arc::clone(&self.camera)
    }

    /// Makes [`Map::camera`] fail with `message`.
    pub fn fail_camera(&self, message: impl Into<String>) {
        *self.camera_error.lock() = Some(message.into());
    }
}

impl Map for InMemoryMap {
    fn camera(&self) -> Result<Arc<dyn Camera>, EngineError> {
        if let Some(message) = self.camera_error.lock().clone() {
            return Err(EngineError::Unavailable(message));
        }
        let camera: Arc<dyn Camera> = self.camera.clone();
        Ok(camera)
    }
}

/// Camera that records every move.
#[derive(Debug, Default)]
pub struct RecordingCamera {
    moves: Mutex<Vec<JsonMap<String, Value>>>,
}

impl RecordingCamera {
    #[must_use]
    pub fn moves(&self) -> Vec<JsonMap<String, Value>> {
        self.moves.lock().clone()
    }
}

impl Camera for RecordingCamera {
    fn move_camera(&self, spec: &JsonMap<String, Value>) -> Result<(), EngineError> {
        if !spec.contains_key("point") {
            return Err(EngineError::Camera("missing 'point'".into()));
        }
        self.moves.lock().push(spec.clone());
        Ok(())
    }
}

/// Cluster renderer that labels a cluster with its size.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainClusterRenderer;

impl ClusterRenderer for PlainClusterRenderer {
    fn render_cluster(&self, members: &[MarkerSpec]) -> Value {
        json!({ "label": members.len().to_string() })
    }
}

/// Renderer wiring of a clustering manager.
struct Clustering {
    renderer: Arc<dyn ClusterRenderer>,
    renders: Arc<Mutex<Vec<Value>>>,
}

#[derive(Default)]
struct FactoryState {
    fail_next: Option<String>,
    clustering_policies: Vec<ClusteringPolicy>,
    created: usize,
}

/// Factory for [`InMemoryMarkerManager`]s, with failure injection.
#[derive(Default)]
pub struct InMemoryObjectManagerFactory {
    state: Mutex<FactoryState>,
    closed: Arc<AtomicUsize>,
    renders: Arc<Mutex<Vec<Value>>>,
}

impl InMemoryObjectManagerFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next create call fail.
    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Number of managers created so far.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    /// Number of managers closed so far.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cluster payloads produced by clustering managers, in order.
    #[must_use]
    pub fn cluster_renders(&self) -> Vec<Value> {
        self.renders.lock().clone()
    }

    /// Policies passed to clustering creates, in order.
    #[must_use]
    pub fn clustering_policies(&self) -> Vec<ClusteringPolicy> {
        self.state.lock().clustering_policies.clone()
    }

    fn make(
        &self,
        clustering: Option<(ClusteringPolicy, Arc<dyn ClusterRenderer>)>,
    ) -> Result<Box<dyn MarkerManager>, EngineError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(EngineError::ObjectManager(message));
        }
        state.created += 1;

        let mut manager = InMemoryMarkerManager::new(Arc::clone(&self.closed));
        if let Some((policy, renderer)) = clustering {
            state.clustering_policies.push(policy);
            manager.clustering = Some(Clustering {
                renderer,
                renders: Arc::clone(&self.renders),
            });
        }
        Ok(Box::new(manager))
    }
}

impl ObjectManagerFactory for InMemoryObjectManagerFactory {
    fn create(&self, _map: &MapHandle) -> Result<Box<dyn MarkerManager>, EngineError> {
        self.make(None)
    }

    fn create_with_clustering(
        &self,
        _map: &MapHandle,
        policy: ClusteringPolicy,
        renderer: Arc<dyn ClusterRenderer>,
    ) -> Result<Box<dyn MarkerManager>, EngineError> {
        self.make(Some((policy, renderer)))
    }
}

/// Ordered marker store. Adding an existing id replaces it in place.
///
/// A clustering manager has no geometry, so it renders the whole layer as
/// one cluster after every change.
pub struct InMemoryMarkerManager {
    markers: Vec<MarkerSpec>,
    closed: Arc<AtomicUsize>,
    clustering: Option<Clustering>,
}

impl InMemoryMarkerManager {
    fn new(closed: Arc<AtomicUsize>) -> Self {
        Self {
            markers: Vec::new(),
            closed,
            clustering: None,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.markers.iter().position(|m| m.id == id)
    }

    fn recluster(&self) {
        if let Some(clustering) = &self.clustering {
            let payload = clustering.renderer.render_cluster(&self.markers);
            clustering.renders.lock().push(payload);
        }
    }
}

impl MarkerManager for InMemoryMarkerManager {
    fn add(&mut self, marker: MarkerSpec) -> Result<(), EngineError> {
        match self.position(&marker.id) {
            Some(i) => self.markers[i] = marker,
            None => self.markers.push(marker),
        }
        self.recluster();
        Ok(())
    }

    fn all(&self) -> Vec<MarkerSpec> {
        self.markers.clone()
    }

    fn get(&self, id: &str) -> Option<MarkerSpec> {
        self.position(id).map(|i| self.markers[i].clone())
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(i) => {
                self.markers.remove(i);
                self.recluster();
                true
            }
            None => false,
        }
    }

    fn remove_all(&mut self) {
        self.markers.clear();
        self.recluster();
    }

    fn update(&mut self, id: &str, marker: MarkerSpec) -> Result<bool, EngineError> {
        match self.position(id) {
            Some(i) => {
                self.markers[i] = marker;
                self.recluster();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn close(&mut self) {
        self.markers.clear();
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
