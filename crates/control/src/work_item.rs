use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One queued invocation awaiting pickup by the runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub request_id: String,
    pub payload: Vec<u8>,
    /// Wall clock deadline handed to the runtime.
    pub deadline_ms: i64,
    pub invoked_function_arn: String,
    pub trace_id: String,
}

impl WorkItem {
    pub fn new(function_name: &str, payload: Vec<u8>, timeout_ms: u64) -> Self {
        let request_id = Uuid::new_v4().to_string();
        let deadline_ms = Utc::now().timestamp_millis() + timeout_ms as i64;
        Self {
            trace_id: format!("Root=1-{:x}-{}", Utc::now().timestamp(), request_id.replace('-', "")),
            invoked_function_arn: format!(
                "arn:aws:lambda:local:000000000000:function:{function_name}"
            ),
            request_id,
            payload,
            deadline_ms,
        }
    }
}
