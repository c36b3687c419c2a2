//! Wire constants of the platform Runtime API.

pub const API_VERSION: &str = "2018-06-01";

pub const HEADER_REQUEST_ID: &str = "lambda-runtime-aws-request-id";
pub const HEADER_DEADLINE_MS: &str = "lambda-runtime-deadline-ms";
pub const HEADER_FUNCTION_ARN: &str = "lambda-runtime-invoked-function-arn";
pub const HEADER_TRACE_ID: &str = "lambda-runtime-trace-id";
pub const HEADER_ERROR_TYPE: &str = "lambda-runtime-function-error-type";

pub fn next_path() -> String {
    format!("/{API_VERSION}/runtime/invocation/next")
}

pub fn response_path(request_id: &str) -> String {
    format!("/{API_VERSION}/runtime/invocation/{request_id}/response")
}

pub fn error_path(request_id: &str) -> String {
    format!("/{API_VERSION}/runtime/invocation/{request_id}/error")
}

pub fn init_error_path() -> String {
    format!("/{API_VERSION}/runtime/init/error")
}
