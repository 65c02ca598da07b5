//! Controller and engine errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`MapError::AlreadyResolved`] | `MAP_ALREADY_RESOLVED` | No |
//! | [`MapError::BadArgument`] | `MAP_BAD_ARGUMENT` | Yes |
//! | [`MapError::LayerNotFound`] | `MAP_LAYER_NOT_FOUND` | Yes |
//! | [`MapError::LayerClosed`] | `MAP_LAYER_CLOSED` | Yes |
//! | [`MapError::MarkerNotFound`] | `MAP_MARKER_NOT_FOUND` | Yes |
//! | [`MapError::EngineNotReady`] | `MAP_ENGINE_NOT_READY` | Yes |
//! | [`MapError::UnknownMethod`] | `MAP_NOT_IMPLEMENTED` | No |
//! | [`MapError::Engine`] | inner [`EngineError`] code | inner |
//!
//! Recoverable means the caller can retry or correct the call.
//! `AlreadyResolved` is a bug and unknown methods need a code change.
//!
//! # Example
//!
//! ```
//! use mapkit_runtime::MapError;
//! use mapkit_types::ErrorCode;
//!
//! let err = MapError::bad_argument("marker", "missing");
//! assert_eq!(err.code(), "MAP_BAD_ARGUMENT");
//! assert!(err.is_recoverable());
//! ```

use mapkit_types::ErrorCode;
use thiserror::Error;

/// Failure raised by an engine collaborator.
///
/// The engine is opaque; these variants only say which capability failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine could not hand out the requested resource.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// Creating a marker object manager failed.
    #[error("object manager failed: {0}")]
    ObjectManager(String),

    /// A camera operation failed.
    #[error("camera failed: {0}")]
    Camera(String),

    /// A marker operation failed inside the engine.
    #[error("marker operation failed: {0}")]
    Marker(String),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "ENGINE_UNAVAILABLE",
            Self::ObjectManager(_) => "ENGINE_OBJECT_MANAGER",
            Self::Camera(_) => "ENGINE_CAMERA",
            Self::Marker(_) => "ENGINE_MARKER",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Error produced while handling a map command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// A readiness cell was resolved twice. Indicates a bug.
    #[error("readiness cell already resolved")]
    AlreadyResolved,

    /// A command argument was missing or had the wrong type.
    #[error("bad argument '{name}': {reason}")]
    BadArgument {
        /// Argument name as sent by the host.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// No registered layer has this identifier.
    #[error("layer not found: {}", display_layer(.0))]
    LayerNotFound(Option<String>),

    /// The layer controller was closed before the operation ran.
    #[error("layer closed: {}", display_layer(.0))]
    LayerClosed(Option<String>),

    /// No marker with this identifier exists in the layer.
    #[error("marker not found: {0}")]
    MarkerNotFound(String),

    /// Readiness did not arrive within the configured bound.
    #[error("engine not ready after {waited_ms}ms")]
    EngineNotReady {
        /// How long the command waited.
        waited_ms: u64,
    },

    /// The method name is not part of the channel surface.
    #[error("method not implemented: {0}")]
    UnknownMethod(String),

    /// The engine itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl MapError {
    /// Creates a [`MapError::BadArgument`].
    pub fn bad_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`MapError::LayerNotFound`].
    pub fn layer_not_found(layer_id: Option<&str>) -> Self {
        Self::LayerNotFound(layer_id.map(str::to_string))
    }
}

impl ErrorCode for MapError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyResolved => "MAP_ALREADY_RESOLVED",
            Self::BadArgument { .. } => "MAP_BAD_ARGUMENT",
            Self::LayerNotFound(_) => "MAP_LAYER_NOT_FOUND",
            Self::LayerClosed(_) => "MAP_LAYER_CLOSED",
            Self::MarkerNotFound(_) => "MAP_MARKER_NOT_FOUND",
            Self::EngineNotReady { .. } => "MAP_ENGINE_NOT_READY",
            Self::UnknownMethod(_) => "MAP_NOT_IMPLEMENTED",
            Self::Engine(inner) => inner.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::BadArgument { .. }
            | Self::LayerNotFound(_)
            | Self::LayerClosed(_)
            | Self::MarkerNotFound(_)
            | Self::EngineNotReady { .. } => true,
            Self::AlreadyResolved | Self::UnknownMethod(_) => false,
            Self::Engine(inner) => inner.is_recoverable(),
        }
    }
}

fn display_layer(layer_id: &Option<String>) -> &str {
    layer_id.as_deref().unwrap_or("<default>")
}
