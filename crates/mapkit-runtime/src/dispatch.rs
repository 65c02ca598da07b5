//! Command dispatch.
//!
//! Each call goes through
//!
//! ```text
//! Received → ArgsValidated → TargetResolved → AwaitingReady → Executed → Succeeded | Failed
//! ```
//!
//! [`MapController::submit`] runs the synchronous part (validation, target
//! lookup, queueing on the target's
//! [`ReadinessCell`](crate::readiness::ReadinessCell)) at call time and
//! returns a future for the result. Operations on one target therefore
//! run in the order they were submitted, even when their futures are
//! awaited concurrently or out of order. Waiting is bounded by
//! `timeouts.ready_ms`; calls on other targets are not held up. A call
//! that timed out is abandoned and never runs.
//!
//! No error escapes: every failure becomes a [`CallError`].

use crate::command::{MapCommand, MarkerOp};
use crate::controller::MapController;
use crate::error::{EngineError, MapError};
use crate::layer::LayerController;
use crate::readiness::within;
use mapkit_types::{CallError, CallResult, ErrorCode, MethodCall};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

type Reply = oneshot::Receiver<Result<Value, MapError>>;

/// A call after its synchronous part ran.
enum Staged {
    Done(Value),
    Queued(Reply),
}

impl MapController {
    /// Handles one method call and reports its outcome.
    pub async fn handle(&self, call: MethodCall) -> CallResult {
        self.submit(call).await
    }

    /// Validates and queues `call` now; the returned future yields the
    /// outcome once the target has run it.
    ///
    /// The future does not borrow the controller and can be spawned.
    pub fn submit(&self, call: MethodCall) -> impl Future<Output = CallResult> + Send + 'static {
        debug!(method = %call.method, "method call received");
        let outcome = self.dispatch(&call);
        let method = call.method;

        async move {
            match outcome.await {
                Ok(value) => {
                    debug!(%method, "method call succeeded");
                    Ok(value)
                }
                Err(err) => {
                    debug!(%method, code = err.code(), error = %err, "method call failed");
                    Err(CallError::from_error(&err))
                }
            }
        }
    }

    /// Like [`handle`](Self::handle) but keeps the typed error.
    ///
    /// # Errors
    ///
    /// Returns the first [`MapError`] raised by validation, lookup,
    /// readiness or the operation itself.
    pub async fn execute(&self, call: &MethodCall) -> Result<Value, MapError> {
        self.dispatch(call).await
    }

    fn dispatch(
        &self,
        call: &MethodCall,
    ) -> impl Future<Output = Result<Value, MapError>> + Send + 'static {
        settle(self.stage(call), self.config().timeouts.ready())
    }

    fn stage(&self, call: &MethodCall) -> Result<Staged, MapError> {
        match MapCommand::parse(call)? {
            MapCommand::AddLayer {
                layer_id,
                clustering,
            } => {
                self.add_layer(layer_id, clustering)?;
                Ok(Staged::Done(Value::Null))
            }
            MapCommand::RemoveLayer { layer_id } => {
                self.remove_layer(layer_id.as_deref());
                Ok(Staged::Done(Value::Null))
            }
            MapCommand::MoveCamera { spec } => {
                let camera = self.camera()?;
                Ok(Staged::Queued(camera.reply_when_ready(
                    move |camera| -> Result<Value, MapError> {
                        camera.move_camera(&spec)?;
                        Ok(Value::Null)
                    },
                )))
            }
            MapCommand::Marker { layer_id, op } => {
                let layer = self.get_layer(layer_id.as_deref())?;
                debug!(?layer_id, op = op.name(), "marker operation queued");
                Ok(Staged::Queued(layer.reply_when_ready(move |layer| {
                    apply_marker_op(&layer, op)
                })))
            }
        }
    }
}

async fn settle(staged: Result<Staged, MapError>, timeout: Duration) -> Result<Value, MapError> {
    match staged? {
        Staged::Done(value) => Ok(value),
        Staged::Queued(rx) => within(rx, timeout).await?,
    }
}

fn apply_marker_op(layer: &LayerController, op: MarkerOp) -> Result<Value, MapError> {
    match op {
        MarkerOp::AddMany(markers) => layer.add_markers(markers)?,
        MarkerOp::Add(marker) => layer.add_marker(marker)?,
        MarkerOp::GetAll => return to_json(&layer.get_all()?),
        MarkerOp::GetById(marker_id) => return Ok(layer.get_by_id(&marker_id)?.user_data),
        MarkerOp::RemoveAll => layer.remove_all()?,
        MarkerOp::RemoveById(marker_id) => layer.remove_by_id(&marker_id)?,
        MarkerOp::Update { marker_id, marker } => layer.update(&marker_id, marker)?,
    }
    Ok(Value::Null)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, MapError> {
    serde_json::to_value(value).map_err(|e| EngineError::Marker(e.to_string()).into())
}
