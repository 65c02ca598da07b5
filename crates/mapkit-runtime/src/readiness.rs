//! Single-resolution readiness cell.
//!
//! A [`ReadinessCell`] starts pending, is resolved exactly once, and runs
//! every callback registered with [`on_ready`](ReadinessCell::on_ready)
//! exactly once with the resolved value.
//!
//! ```text
//!  on_ready(a) ──┐
//!  on_ready(b) ──┼──► Pending [a, b] ──resolve(v)──► Draining ──► Ready(v)
//!                │                                      │
//!  on_ready(c) ──┴──────────────── (while draining) ────┘  c runs after a, b
//! ```
//!
//! Callbacks never run under the internal lock, so a callback may freely
//! register further callbacks on the same or other cells. Cells compose
//! into one-shot chains: a layer's cell is resolved from a callback
//! registered on the engine cell.
//!
//! [`reply_when_ready`](ReadinessCell::reply_when_ready) queues an
//! operation whose result comes back over a oneshot channel. Once the
//! receiver is dropped the operation is abandoned: it is pruned from the
//! queue on the next registration and skipped if the cell resolves first.

use crate::error::MapError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// A queued continuation.
trait Waiter<T>: Send {
    /// True once nobody is interested in the outcome any more.
    fn is_abandoned(&self) -> bool {
        false
    }

    fn fire(self: Box<Self>, value: T);
}

struct Callback<F>(F);

impl<T, F> Waiter<T> for Callback<F>
where
    F: FnOnce(T) + Send,
{
    fn fire(self: Box<Self>, value: T) {
        let Callback(callback) = *self;
        callback(value);
    }
}

struct Reply<R, F> {
    tx: oneshot::Sender<R>,
    op: F,
}

impl<T, R, F> Waiter<T> for Reply<R, F>
where
    R: Send,
    F: FnOnce(T) -> R + Send,
{
    fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    fn fire(self: Box<Self>, value: T) {
        let Reply { tx, op } = *self;
        if tx.is_closed() {
            warn!("waiter gave up before the cell was ready, operation skipped");
            return;
        }
        let _ = tx.send(op(value));
    }
}

type Queue<T> = Vec<Box<dyn Waiter<T>>>;

enum Slot<T> {
    Pending(Queue<T>),
    /// Resolved; callbacks queued before or during resolution are still
    /// being run by the resolving thread.
    Draining(T, Queue<T>),
    Ready(T),
}

/// One-shot future with callback registration.
///
/// Cloning a cell yields another handle to the same slot.
pub struct ReadinessCell<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for ReadinessCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for ReadinessCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.lock() {
            Slot::Pending(q) => format!("Pending({})", q.len()),
            Slot::Draining(_, q) => format!("Draining({})", q.len()),
            Slot::Ready(_) => "Ready".to_string(),
        };
        f.debug_struct("ReadinessCell").field("state", &state).finish()
    }
}

impl<T> Default for ReadinessCell<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadinessCell<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a pending cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Pending(Vec::new()))),
        }
    }

    /// Returns true once [`resolve`](Self::resolve) has been called.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(&*self.slot.lock(), Slot::Pending(_))
    }

    /// Returns the value if resolved.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        match &*self.slot.lock() {
            Slot::Pending(_) => None,
            Slot::Draining(v, _) | Slot::Ready(v) => Some(v.clone()),
        }
    }

    /// Number of continuations still waiting for resolution.
    #[must_use]
    pub fn queued(&self) -> usize {
        match &*self.slot.lock() {
            Slot::Pending(q) | Slot::Draining(_, q) => q.len(),
            Slot::Ready(_) => 0,
        }
    }

    /// Resolves the cell and runs queued callbacks in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::AlreadyResolved`] if the cell was resolved before.
    /// The stored value is left untouched.
    pub fn resolve(&self, value: T) -> Result<(), MapError> {
        let mut batch = {
            let mut slot = self.slot.lock();
            match &mut *slot {
                Slot::Pending(queue) => {
                    let queued = std::mem::take(queue);
                    *slot = Slot::Draining(value.clone(), Vec::new());
                    queued
                }
                Slot::Draining(..) | Slot::Ready(_) => return Err(MapError::AlreadyResolved),
            }
        };

        loop {
            if !batch.is_empty() {
                debug!(count = batch.len(), "running readiness callbacks");
            }
            for waiter in batch {
                waiter.fire(value.clone());
            }

            let mut slot = self.slot.lock();
            match &mut *slot {
                Slot::Draining(_, late) if !late.is_empty() => {
                    batch = std::mem::take(late);
                }
                _ => {
                    *slot = Slot::Ready(value);
                    return Ok(());
                }
            }
        }
    }

    /// Runs `callback` with the value once resolved.
    ///
    /// Runs synchronously on the calling thread when the cell is already
    /// ready; otherwise queues it behind every earlier registration.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.push(Box::new(Callback(callback)));
    }

    /// Queues `op` like [`on_ready`](Self::on_ready) and returns a receiver
    /// for its result.
    ///
    /// Dropping the receiver abandons `op`.
    pub fn reply_when_ready<R, F>(&self, op: F) -> oneshot::Receiver<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.push(Box::new(Reply { tx, op }));
        rx
    }

    fn push(&self, waiter: Box<dyn Waiter<T>>) {
        let value = {
            let mut slot = self.slot.lock();
            match &mut *slot {
                Slot::Pending(queue) | Slot::Draining(_, queue) => {
                    let before = queue.len();
                    queue.retain(|queued| !queued.is_abandoned());
                    if queue.len() < before {
                        debug!(pruned = before - queue.len(), "dropped abandoned waiters");
                    }
                    queue.push(waiter);
                    return;
                }
                Slot::Ready(v) => v.clone(),
            }
        };
        waiter.fire(value);
    }
}

/// Awaits a reply from [`ReadinessCell::reply_when_ready`], bounded by
/// `timeout`. On timeout the receiver is dropped, abandoning the operation.
///
/// # Errors
///
/// Returns [`MapError::EngineNotReady`] if no reply arrives in time.
pub async fn within<R>(rx: oneshot::Receiver<R>, timeout: Duration) -> Result<R, MapError> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) | Err(_) => {
            let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(waited_ms, "target not ready in time");
            Err(MapError::EngineNotReady { waited_ms })
        }
    }
}
