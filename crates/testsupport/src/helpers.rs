use anyhow::Result;
use chrono::Utc;
use geo_runtime_models::{InvocationContext, InvocationRequest};
use serde_json::Value;
use std::time::Duration;

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Builds a request with a deadline `timeout_ms` from now.
pub fn request(request_id: &str, payload: Value, timeout_ms: i64) -> InvocationRequest {
    InvocationRequest::new(
        payload,
        InvocationContext::new(request_id, now_ms() + timeout_ms),
    )
}

/// Poll until a condition is met or timeout
pub async fn poll_until<F, Fut>(
    description: &str,
    timeout_duration: Duration,
    mut condition: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(20);

    loop {
        if start.elapsed() >= timeout_duration {
            anyhow::bail!("Timeout waiting for: {}", description);
        }

        if condition().await? {
            return Ok(());
        }

        tokio::time::sleep(poll_interval).await;
    }
}
