use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use geo_runtime_control::{pending::InvocationResult, work_item::WorkItem};
use geo_runtime_models::runtime_api::{
    HEADER_DEADLINE_MS, HEADER_ERROR_TYPE, HEADER_FUNCTION_ARN, HEADER_REQUEST_ID,
    HEADER_TRACE_ID,
};
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tracing::{info, instrument, warn};

use crate::state::RtState;

pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

fn json_response<T: serde::Serialize>(status: StatusCode, v: &T) -> Response {
    let mut res = Response::new(Body::from(serde_json::to_vec(v).unwrap_or_default()));
    *res.status_mut() = status;
    res.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    res
}

fn function_error_response(body: Vec<u8>) -> Response {
    let mut res = Response::new(Body::from(body));
    res.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    res.headers_mut()
        .insert(FUNCTION_ERROR_HEADER, HeaderValue::from_static("Unhandled"));
    res
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[instrument(skip(state))]
pub async fn runtime_next(State(state): State<RtState>) -> Response {
    // Long-poll until work arrives or the emulator shuts down
    let Some(wi) = state.queue.pop_or_wait().await else {
        info!("queue closed, telling runtime to exit");
        return json_response(StatusCode::GONE, &json!({"error": "shutting down"}));
    };

    info!(request_id = %wi.request_id, "dispatching work item to runtime");
    let mut res = Response::new(Body::from(wi.payload));
    let headers = res.headers_mut();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(HEADER_REQUEST_ID, header_value(&wi.request_id));
    headers.insert(HEADER_DEADLINE_MS, header_value(&wi.deadline_ms.to_string()));
    headers.insert(HEADER_FUNCTION_ARN, header_value(&wi.invoked_function_arn));
    headers.insert(HEADER_TRACE_ID, header_value(&wi.trace_id));
    res
}

#[instrument(skip(state, body), fields(req_id = %request_id))]
pub async fn runtime_response(
    Path(request_id): Path<String>,
    State(state): State<RtState>,
    body: bytes::Bytes,
) -> StatusCode {
    let delivered = state
        .pending
        .complete(&request_id, InvocationResult::ok(body.to_vec()));
    result_status(&state, &request_id, delivered)
}

#[instrument(skip(state, body, headers), fields(req_id = %request_id))]
pub async fn runtime_error(
    Path(request_id): Path<String>,
    State(state): State<RtState>,
    headers: HeaderMap,
    body: bytes::Bytes,
) -> StatusCode {
    // Header first, then the body's "error" field, default Unhandled
    let kind = headers
        .get(HEADER_ERROR_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| "Unhandled".to_string());

    let delivered = state
        .pending
        .complete(&request_id, InvocationResult::err(&kind, body.to_vec()));
    result_status(&state, &request_id, delivered)
}

// Late results for timed-out invocations are accepted and dropped
fn result_status(state: &RtState, request_id: &str, delivered: bool) -> StatusCode {
    if delivered {
        StatusCode::ACCEPTED
    } else if state.pending.take_expired(request_id) {
        info!(request_id = %request_id, "discarding result of timed-out invocation");
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

#[instrument(skip(state, body))]
pub async fn runtime_init_error(State(state): State<RtState>, body: bytes::Bytes) -> StatusCode {
    let error = serde_json::from_slice::<Value>(&body)
        .unwrap_or_else(|_| json!({"error": "Runtime.Unknown", "message": String::from_utf8_lossy(&body)}));
    warn!(error = %error, "runtime reported an init error");
    state.record_init_error(error);
    StatusCode::ACCEPTED
}

pub async fn runtime_healthz() -> &'static str {
    "ok"
}

/// Synchronous invoke: queue the event and wait for the runtime's answer.
#[instrument(skip(state, body), fields(function = %function_name))]
pub async fn invoke(
    Path(function_name): Path<String>,
    State(state): State<RtState>,
    body: bytes::Bytes,
) -> Response {
    if function_name != state.function_name {
        return json_response(
            StatusCode::NOT_FOUND,
            &json!({
                "error": "ResourceNotFoundException",
                "message": format!("Function not found: {function_name}"),
            }),
        );
    }

    if let Some(init_error) = state.init_error() {
        return function_error_response(serde_json::to_vec(&init_error).unwrap_or_default());
    }

    let payload = if body.is_empty() {
        b"{}".to_vec()
    } else {
        body.to_vec()
    };
    let wi = WorkItem::new(&state.function_name, payload, state.timeout_ms);
    let request_id = wi.request_id.clone();
    let rx = state.pending.register(request_id.clone());

    if !state.queue.push(wi) {
        state.pending.forget(&request_id);
        return json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({"error": "ServiceException", "message": "emulator is shutting down"}),
        );
    }

    match timeout(Duration::from_millis(state.timeout_ms), rx).await {
        Ok(Ok(result)) if result.ok => {
            let mut res = Response::new(Body::from(result.payload));
            res.headers_mut().insert(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            res
        }
        Ok(Ok(result)) => function_error_response(result.payload),
        Ok(Err(_)) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({"error": "ServiceException", "message": "invocation was dropped"}),
        ),
        Err(_) => {
            if state.queue.remove(&request_id) {
                state.pending.forget(&request_id);
            } else {
                // Already handed to the runtime
                state.pending.expire(&request_id);
            }
            warn!(request_id = %request_id, timeout_ms = state.timeout_ms, "invocation timed out");
            function_error_response(
                serde_json::to_vec(&json!({
                    "error": "TaskTimedOut",
                    "message": format!("Task timed out after {} ms", state.timeout_ms),
                }))
                .unwrap_or_default(),
            )
        }
    }
}

/// Queue depth and waiting invocations, for local debugging.
pub async fn runtime_status(State(state): State<RtState>) -> impl IntoResponse {
    json_response(
        StatusCode::OK,
        &json!({
            "function_name": state.function_name,
            "queued": state.queue.len(),
            "pending": state.pending.len(),
            "init_error": state.init_error(),
        }),
    )
}
