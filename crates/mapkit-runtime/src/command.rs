//! Method-channel commands.
//!
//! [`MapCommand::parse`] turns a [`MethodCall`] into a typed command. All
//! argument validation happens here, before anything is mutated.
//!
//! | Method | Required args | Result |
//! |--------|---------------|--------|
//! | `map#addLayer` | `layerId` | null |
//! | `map#addLayerWithClustering` | `layerId` | null |
//! | `map#removeLayer` | `layerId` | null |
//! | `camera#move` | whole map | null |
//! | `markers#addMarkers` | `layerId`, `markers` | null |
//! | `markers#addMarker` | `layerId`, `marker` | null |
//! | `markers#getAll` | `layerId` | marker list |
//! | `markers#getById` | `layerId`, `markerId` | user data |
//! | `markers#removeAll` | `layerId` | null |
//! | `markers#removeById` | `layerId`, `markerId` | null |
//! | `markers#update` | `layerId`, `markerId`, `newMarker` | null |

use crate::args::Args;
use crate::error::MapError;
use mapkit_types::{MarkerSpec, MethodCall};
use serde_json::{Map as JsonMap, Value};

pub const ADD_LAYER: &str = "map#addLayer";
pub const ADD_LAYER_WITH_CLUSTERING: &str = "map#addLayerWithClustering";
pub const REMOVE_LAYER: &str = "map#removeLayer";
pub const CAMERA_MOVE: &str = "camera#move";
pub const ADD_MARKERS: &str = "markers#addMarkers";
pub const ADD_MARKER: &str = "markers#addMarker";
pub const GET_ALL: &str = "markers#getAll";
pub const GET_BY_ID: &str = "markers#getById";
pub const REMOVE_ALL: &str = "markers#removeAll";
pub const REMOVE_BY_ID: &str = "markers#removeById";
pub const UPDATE: &str = "markers#update";

/// A validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    AddLayer {
        layer_id: Option<String>,
        clustering: bool,
    },
    RemoveLayer {
        layer_id: Option<String>,
    },
    MoveCamera {
        spec: JsonMap<String, Value>,
    },
    Marker {
        layer_id: Option<String>,
        op: MarkerOp,
    },
}

/// Operation on one layer's markers.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerOp {
    AddMany(Vec<MarkerSpec>),
    Add(MarkerSpec),
    GetAll,
    GetById(String),
    RemoveAll,
    RemoveById(String),
    Update { marker_id: String, marker: MarkerSpec },
}

impl MarkerOp {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddMany(_) => "addMarkers",
            Self::Add(_) => "addMarker",
            Self::GetAll => "getAll",
            Self::GetById(_) => "getById",
            Self::RemoveAll => "removeAll",
            Self::RemoveById(_) => "removeById",
            Self::Update { .. } => "update",
        }
    }
}

impl MapCommand {
    /// Validates `call` into a command.
    ///
    /// # Errors
    ///
    /// - [`MapError::UnknownMethod`] for a method outside the table above
    /// - [`MapError::BadArgument`] for a missing or malformed argument
    pub fn parse(call: &MethodCall) -> Result<Self, MapError> {
        let args = Args::new(&call.arguments)?;

        let command = match call.method.as_str() {
            ADD_LAYER => Self::AddLayer {
                layer_id: args.layer_id()?,
                clustering: false,
            },
            ADD_LAYER_WITH_CLUSTERING => Self::AddLayer {
                layer_id: args.layer_id()?,
                clustering: true,
            },
            REMOVE_LAYER => Self::RemoveLayer {
                layer_id: args.layer_id()?,
            },
            CAMERA_MOVE => Self::MoveCamera {
                spec: args.as_map().clone(),
            },
            ADD_MARKERS => marker(&args, MarkerOp::AddMany(args.parse("markers")?))?,
            ADD_MARKER => marker(&args, MarkerOp::Add(args.parse("marker")?))?,
            GET_ALL => marker(&args, MarkerOp::GetAll)?,
            GET_BY_ID => marker(&args, MarkerOp::GetById(args.string("markerId")?))?,
            REMOVE_ALL => marker(&args, MarkerOp::RemoveAll)?,
            REMOVE_BY_ID => marker(&args, MarkerOp::RemoveById(args.string("markerId")?))?,
            UPDATE => marker(
                &args,
                MarkerOp::Update {
                    marker_id: args.string("markerId")?,
                    marker: args.parse("newMarker")?,
                },
            )?,
            other => return Err(MapError::UnknownMethod(other.to_string())),
        };

        Ok(command)
    }
}

fn marker(args: &Args<'_>, op: MarkerOp) -> Result<MapCommand, MapError> {
    Ok(MapCommand::Marker {
        layer_id: args.layer_id()?,
        op,
    })
}
