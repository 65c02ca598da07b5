//! Method-channel envelopes.
//!
//! A [`MethodCall`] is what the host sends; a call completes with either
//! a JSON value or a [`CallError`].

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A named command with a schema-less argument bag.
///
/// ```
/// use mapkit_types::MethodCall;
/// use serde_json::json;
///
/// let call = MethodCall::new("map#addLayer", json!({"layerId": "poi"}));
/// assert_eq!(call.method, "map#addLayer");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method name, e.g. `markers#getAll`.
    pub method: String,
    /// Argument bag. Normally an object; validated per method.
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    /// Creates a call.
    #[must_use]
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method)
    }
}

/// Structured failure reported back over the channel.
///
/// Mirrors the `(errorTag, message, details)` triple hosts expect.
/// `details` is always `None` today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct CallError {
    /// Error tag (the [`ErrorCode::code`] of the failure).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Extra payload.
    pub details: Option<Value>,
}

impl CallError {
    /// Builds a call error from any coded error.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: ErrorCode + fmt::Display,
    {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

/// Outcome of a single method call.
pub type CallResult = Result<Value, CallError>;
