//! Typed extraction of command arguments.
//!
//! Every failure is a [`MapError::BadArgument`] naming the offending
//! argument, so validation errors look the same for every command.

use crate::error::MapError;
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value};

/// Argument key selecting the target layer.
pub const LAYER_ID: &str = "layerId";

static EMPTY: std::sync::OnceLock<JsonMap<String, Value>> = std::sync::OnceLock::new();

/// Borrowed view over a command's argument object.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    map: &'a JsonMap<String, Value>,
}

impl<'a> Args<'a> {
    /// Wraps the argument bag. `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BadArgument`] for any other non-object value.
    pub fn new(arguments: &'a Value) -> Result<Self, MapError> {
        match arguments {
            Value::Object(map) => Ok(Self { map }),
            Value::Null => Ok(Self {
                map: EMPTY.get_or_init(JsonMap::new),
            }),
            other => Err(MapError::bad_argument(
                "arguments",
                format!("expected object, got {}", type_name(other)),
            )),
        }
    }

    /// The full argument object.
    #[must_use]
    pub fn as_map(&self) -> &'a JsonMap<String, Value> {
        self.map
    }

    /// Reads `layerId`. The key must be present; `null` selects the
    /// default layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BadArgument`] if the key is absent or not a
    /// string or `null`.
    pub fn layer_id(&self) -> Result<Option<String>, MapError> {
        match self.map.get(LAYER_ID) {
            None => Err(MapError::bad_argument(LAYER_ID, "missing")),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(MapError::bad_argument(
                LAYER_ID,
                format!("expected string or null, got {}", type_name(other)),
            )),
        }
    }

    /// Reads a required string.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BadArgument`] if missing, null or not a string.
    pub fn string(&self, name: &str) -> Result<String, MapError> {
        match self.present(name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(MapError::bad_argument(
                name,
                format!("expected string, got {}", type_name(other)),
            )),
        }
    }

    /// Deserializes a required argument into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BadArgument`] if missing, null or malformed.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, MapError> {
        let value = self.present(name)?;
        T::deserialize(value).map_err(|e| MapError::bad_argument(name, e.to_string()))
    }

    fn present(&self, name: &str) -> Result<&'a Value, MapError> {
        match self.map.get(name) {
            None | Some(Value::Null) => Err(MapError::bad_argument(name, "missing")),
            Some(value) => Ok(value),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
