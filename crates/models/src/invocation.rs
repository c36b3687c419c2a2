use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ErrorShape;

/// Per-invocation metadata delivered alongside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationContext {
    pub request_id: String,
    /// Wall clock deadline in epoch milliseconds. Advisory only.
    pub deadline_ms: i64,
    #[serde(default)]
    pub invoked_function_arn: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>, deadline_ms: i64) -> Self {
        Self {
            request_id: request_id.into(),
            deadline_ms,
            invoked_function_arn: None,
            trace_id: None,
        }
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        let left = self.deadline_ms.saturating_sub(Utc::now().timestamp_millis());
        Duration::from_millis(left.max(0) as u64)
    }

    pub fn is_past_deadline(&self) -> bool {
        Utc::now().timestamp_millis() >= self.deadline_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationRequest {
    pub payload: serde_json::Value,
    pub context: InvocationContext,
}

impl InvocationRequest {
    pub fn new(payload: serde_json::Value, context: InvocationContext) -> Self {
        Self { payload, context }
    }

    pub fn request_id(&self) -> &str {
        &self.context.request_id
    }
}

/// Outbound only: a success value may itself look like an error shape, so
/// this type is never read back from JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    Failure(ErrorShape),
    Success(serde_json::Value),
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResponse::Success(_))
    }

    pub fn error_type(&self) -> Option<&str> {
        match self {
            InvocationResponse::Failure(shape) => Some(&shape.error),
            InvocationResponse::Success(_) => None,
        }
    }
}
