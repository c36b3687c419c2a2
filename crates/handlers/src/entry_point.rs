use geo_runtime_loader::{handler_fn, HandlerError, Module};
use geo_runtime_models::InvocationContext;
use serde_json::{json, Value};
use tracing::debug;

pub const MODULE: &str = "handler.entry_point";

pub fn module() -> Module {
    Module::new().function("lambda_handler", handler_fn(lambda_handler))
}

/// Health-check style entry point: `ping` and `echo` operations.
pub fn lambda_handler(event: Value, context: &InvocationContext) -> Result<Value, HandlerError> {
    let op = event
        .get("op")
        .ok_or_else(|| HandlerError::value_error("missing 'op' field"))?
        .as_str()
        .ok_or_else(|| HandlerError::value_error("'op' must be a string"))?;

    debug!(request_id = %context.request_id, op = %op, "entry point invoked");
    match op {
        "ping" => Ok(json!({"result": "pong"})),
        "echo" => Ok(json!({"result": event.clone()})),
        other => Err(HandlerError::value_error(format!(
            "unsupported operation: {other}"
        ))),
    }
}
