use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct InvocationResult {
    pub ok: bool,
    pub payload: Vec<u8>,
    /// Reported error type for failed invocations.
    pub error_type: Option<String>,
}

impl InvocationResult {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            ok: true,
            payload,
            error_type: None,
        }
    }

    pub fn err(kind: &str, payload: Vec<u8>) -> Self {
        Self {
            ok: false,
            payload,
            error_type: Some(kind.to_string()),
        }
    }
}

/// Invocations waiting for the runtime to post a result.
#[derive(Clone, Default)]
pub struct Pending {
    inner: Arc<DashMap<String, oneshot::Sender<InvocationResult>>>,
    /// Timed-out invocations already handed to the runtime.
    expired: Arc<DashMap<String, ()>>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter; the receiver resolves once the result is posted.
    pub fn register(&self, req_id: String) -> oneshot::Receiver<InvocationResult> {
        let (tx, rx) = oneshot::channel();
        debug!(request_id = %req_id, "Registered pending waiter");
        self.inner.insert(req_id, tx);
        rx
    }

    /// Returns false for unknown, late or duplicate results.
    pub fn complete(&self, req_id: &str, res: InvocationResult) -> bool {
        if let Some((_, tx)) = self.inner.remove(req_id) {
            let _ = tx.send(res);
            debug!(request_id = %req_id, "Completed pending invocation");
            true
        } else {
            warn!(request_id = %req_id, "Attempted to complete unknown request");
            false
        }
    }

    /// Drops the waiter without a result, e.g. after the caller timed out.
    pub fn forget(&self, req_id: &str) -> bool {
        self.inner.remove(req_id).is_some()
    }

    /// Drops the waiter but remembers the id so a late result can be discarded.
    pub fn expire(&self, req_id: &str) -> bool {
        let was_waiting = self.forget(req_id);
        self.expired.insert(req_id.to_string(), ());
        was_waiting
    }

    /// True once for an id passed to [`Pending::expire`].
    pub fn take_expired(&self, req_id: &str) -> bool {
        self.expired.remove(req_id).is_some()
    }

    pub fn is_waiting(&self, req_id: &str) -> bool {
        self.inner.contains_key(req_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
