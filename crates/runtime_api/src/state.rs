use std::sync::{Arc, Mutex, PoisonError};

use geo_runtime_control::{pending::Pending, queues::Queue};
use serde_json::Value;

#[derive(Clone)]
pub struct RtState {
    pub queue: Queue,
    pub pending: Pending,
    pub function_name: String,
    pub timeout_ms: u64,
    init_error: Arc<Mutex<Option<Value>>>,
}

impl RtState {
    pub fn new(function_name: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            queue: Queue::new(),
            pending: Pending::new(),
            function_name: function_name.into(),
            timeout_ms,
            init_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn record_init_error(&self, error: Value) {
        *self.init_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn init_error(&self) -> Option<Value> {
        self.init_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
