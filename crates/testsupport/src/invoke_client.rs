use anyhow::Result;
use reqwest::Client;
use serde_json::Value;

/// Outcome of a synchronous invoke against the emulator.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOutcome {
    pub status: u16,
    /// Value of `x-amz-function-error`, set for failed invocations.
    pub function_error: Option<String>,
    pub body: Value,
}

impl InvokeOutcome {
    pub fn is_success(&self) -> bool {
        self.status == 200 && self.function_error.is_none()
    }
}

pub struct InvokeClient {
    client: Client,
    base_url: String,
}

impl InvokeClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn invoke(&self, function_name: &str, payload: &Value) -> Result<InvokeOutcome> {
        let response = self
            .client
            .post(format!(
                "{}/2015-03-31/functions/{}/invocations",
                self.base_url, function_name
            ))
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let function_error = response
            .headers()
            .get("x-amz-function-error")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(InvokeOutcome {
            status,
            function_error,
            body,
        })
    }

    pub async fn status(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/runtime/status", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Status request failed: {}", error_text);
        }
        Ok(response.json().await?)
    }
}
