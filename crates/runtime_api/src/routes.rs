use crate::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};

pub fn build_router(state: crate::state::RtState) -> Router {
    Router::new()
        .route("/runtime/healthz", get(runtime_healthz))
        .route("/runtime/status", get(runtime_status))
        .route("/2018-06-01/runtime/invocation/next", get(runtime_next))
        .route(
            "/2018-06-01/runtime/invocation/:request_id/response",
            post(runtime_response),
        )
        .route(
            "/2018-06-01/runtime/invocation/:request_id/error",
            post(runtime_error),
        )
        .route("/2018-06-01/runtime/init/error", post(runtime_init_error))
        .route(
            "/2015-03-31/functions/:function_name/invocations",
            post(invoke),
        )
        .with_state(state)
}
