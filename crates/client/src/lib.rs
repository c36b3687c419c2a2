use async_trait::async_trait;
use geo_runtime_dispatcher::Transport;
use geo_runtime_models::runtime_api::{
    error_path, init_error_path, next_path, response_path, HEADER_DEADLINE_MS, HEADER_ERROR_TYPE,
    HEADER_FUNCTION_ARN, HEADER_REQUEST_ID, HEADER_TRACE_ID,
};
use geo_runtime_models::{
    ErrorShape, InvocationContext, InvocationRequest, InvocationResponse, RuntimeError,
};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Transport over the platform Runtime API (`AWS_LAMBDA_RUNTIME_API`).
#[derive(Clone, Debug)]
pub struct RuntimeApiClient {
    http: Client,
    base_url: String,
}

impl RuntimeApiClient {
    /// `endpoint` is `host:port`, optionally with an `http://` scheme.
    pub fn new(endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        };
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self))]
    pub async fn next(&self) -> Result<Option<InvocationRequest>, RuntimeError> {
        let res = self
            .http
            .get(format!("{}{}", self.base_url, next_path()))
            .send()
            .await
            .map_err(RuntimeError::transport)?;

        match res.status() {
            StatusCode::OK => {}
            StatusCode::GONE => {
                debug!("Runtime API reported shutdown");
                return Ok(None);
            }
            status => {
                let body = res.text().await.unwrap_or_default();
                return Err(RuntimeError::transport(format!(
                    "next invocation failed with {status}: {body}"
                )));
            }
        }

        let context = context_from_headers(res.headers())?;
        let body = res.bytes().await.map_err(RuntimeError::transport)?;
        let payload = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).map_err(|e| {
                RuntimeError::transport(format!(
                    "invalid event body for {}: {e}",
                    context.request_id
                ))
            })?
        };

        Ok(Some(InvocationRequest::new(payload, context)))
    }

    #[instrument(skip(self, value))]
    pub async fn post_response(&self, request_id: &str, value: &Value) -> Result<(), RuntimeError> {
        let res = self
            .http
            .post(format!("{}{}", self.base_url, response_path(request_id)))
            .json(value)
            .send()
            .await
            .map_err(RuntimeError::transport)?;
        expect_accepted(res.status(), "response")
    }

    #[instrument(skip(self, error), fields(error_type = %error.error))]
    pub async fn post_error(&self, request_id: &str, error: &ErrorShape) -> Result<(), RuntimeError> {
        let res = self
            .http
            .post(format!("{}{}", self.base_url, error_path(request_id)))
            .header(HEADER_ERROR_TYPE, error.error.as_str())
            .json(error)
            .send()
            .await
            .map_err(RuntimeError::transport)?;
        expect_accepted(res.status(), "error")
    }

    #[instrument(skip(self, error), fields(error_type = %error.error))]
    pub async fn post_init_error(&self, error: &ErrorShape) -> Result<(), RuntimeError> {
        let res = self
            .http
            .post(format!("{}{}", self.base_url, init_error_path()))
            .header(HEADER_ERROR_TYPE, error.error.as_str())
            .json(error)
            .send()
            .await
            .map_err(RuntimeError::transport)?;
        expect_accepted(res.status(), "init error")
    }
}

fn expect_accepted(status: StatusCode, what: &str) -> Result<(), RuntimeError> {
    if status.is_success() {
        Ok(())
    } else {
        warn!(%status, "Runtime API rejected {}", what);
        Err(RuntimeError::transport(format!(
            "runtime API rejected {what} with {status}"
        )))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn context_from_headers(headers: &HeaderMap) -> Result<InvocationContext, RuntimeError> {
    let request_id = header_str(headers, HEADER_REQUEST_ID)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RuntimeError::transport("next invocation is missing a request id"))?;

    // Without a deadline header the invocation gets no advisory limit.
    let deadline_ms = header_str(headers, HEADER_DEADLINE_MS)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(i64::MAX);

    Ok(InvocationContext {
        request_id: request_id.to_string(),
        deadline_ms,
        invoked_function_arn: header_str(headers, HEADER_FUNCTION_ARN).map(str::to_string),
        trace_id: header_str(headers, HEADER_TRACE_ID).map(str::to_string),
    })
}

#[async_trait]
impl Transport for RuntimeApiClient {
    async fn next_invocation(&mut self) -> Result<Option<InvocationRequest>, RuntimeError> {
        self.next().await
    }

    async fn send_response(
        &mut self,
        request_id: &str,
        response: &InvocationResponse,
    ) -> Result<(), RuntimeError> {
        match response {
            InvocationResponse::Success(value) => self.post_response(request_id, value).await,
            InvocationResponse::Failure(shape) => self.post_error(request_id, shape).await,
        }
    }

    async fn report_init_error(&mut self, error: &ErrorShape) -> Result<(), RuntimeError> {
        self.post_init_error(error).await
    }
}
