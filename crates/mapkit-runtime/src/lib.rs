//! mapkit runtime - controller layer for an embedded map engine.
//!
//! The map engine becomes usable asynchronously, yet the host may send
//! commands at any time. This crate gates every operation behind a single
//! readiness signal, keeps a registry of independently addressable marker
//! layers, and dispatches method-channel calls to the right layer or to
//! the camera.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  mapkit-types   : MethodCall, CallError, ErrorCode, markers │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Runtime Layer (THIS CRATE)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  readiness  : ReadinessCell (one-shot, callback-based)      │
//! │  layer      : LayerControllerBuilder, LayerController       │
//! │  registry   : LayerRegistry (ordered, first match wins)     │
//! │  camera     : CameraControllerBuilder, CameraController     │
//! │  command    : MapCommand (typed, validated)                 │
//! │  controller : MapController (+ dispatch: handle/execute)    │
//! │  engine     : collaborator traits                           │
//! │  memory     : in-memory engine                              │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  mapkit-cli     : script replay                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mapkit_runtime::memory::{InMemoryEngine, InMemoryObjectManagerFactory, PlainClusterRenderer};
//! use mapkit_runtime::{MapConfig, MapController, RenderContext};
//! use mapkit_types::MethodCall;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let engine = InMemoryEngine::new();
//!     let render = RenderContext::new(
//!         Arc::new(InMemoryObjectManagerFactory::new()),
//!         Arc::new(PlainClusterRenderer),
//!     );
//!     let map = MapController::new(MapConfig::default(), &engine, render);
//!
//!     map.handle(MethodCall::new("map#addLayer", json!({"layerId": "poi"})))
//!         .await
//!         .unwrap();
//!     engine.fire_ready();
//!
//!     let all = map
//!         .handle(MethodCall::new("markers#getAll", json!({"layerId": "poi"})))
//!         .await
//!         .unwrap();
//!     assert_eq!(all, json!([]));
//! });
//! ```

pub mod args;
pub mod camera;
pub mod command;
pub mod config;
mod controller;
mod dispatch;
pub mod engine;
mod error;
pub mod layer;
pub mod memory;
pub mod readiness;
pub mod registry;

pub use camera::{CameraController, CameraControllerBuilder};
pub use command::{MapCommand, MarkerOp};
pub use config::{ClusteringPolicy, ConfigError, ConfigLoader, MapConfig};
pub use controller::MapController;
pub use engine::{
    Camera, ClusterRenderer, Map, MapEngine, MapHandle, MarkerManager, ObjectManagerFactory,
    ReadyCallback, RenderContext,
};
pub use error::{EngineError, MapError};
pub use layer::{LayerController, LayerControllerBuilder};
pub use readiness::ReadinessCell;
pub use registry::LayerRegistry;
