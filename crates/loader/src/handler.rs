use async_trait::async_trait;
use geo_runtime_models::{InvocationContext, RuntimeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

/// Error raised by a handler while processing one invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    /// Recoverable: reported back to the caller as a failure response.
    #[error("{kind}: {message}")]
    Raised {
        kind: String,
        message: String,
        stack_trace: Vec<String>,
    },

    /// Unrecoverable: the runtime answers the invocation, then terminates.
    #[error("Fatal resource error: {message}")]
    Fatal { message: String },
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::Raised {
            kind: kind.into(),
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        HandlerError::Fatal {
            message: message.into(),
        }
    }

    /// Appends a frame to the stack trace of a raised error.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        if let HandlerError::Raised { stack_trace, .. } = &mut self {
            stack_trace.push(frame.into());
        }
        self
    }

    pub fn kind(&self) -> &str {
        match self {
            HandlerError::Raised { kind, .. } => kind,
            HandlerError::Fatal { .. } => "FatalResourceError",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, HandlerError::Fatal { .. })
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::value_error(e.to_string())
    }
}

impl From<HandlerError> for RuntimeError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Raised {
                kind,
                message,
                stack_trace,
            } => RuntimeError::HandlerExecutionError {
                kind,
                message,
                stack_trace,
            },
            HandlerError::Fatal { message } => RuntimeError::FatalResourceError { message },
        }
    }
}

/// A resolved entry point that processes one invocation payload.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, event: Value, context: &InvocationContext) -> Result<Value, HandlerError>;
}

/// Adapts a synchronous closure over raw JSON into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Value, &InvocationContext) -> Result<Value, HandlerError> + Send + Sync,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(Value, &InvocationContext) -> Result<Value, HandlerError> + Send + Sync,
{
    async fn call(&self, event: Value, context: &InvocationContext) -> Result<Value, HandlerError> {
        (self.f)(event, context)
    }
}

/// Adapts a closure over typed input/output; decoding failures raise `ValueError`.
pub struct TypedFnHandler<F, I, O> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

pub fn typed_handler_fn<F, I, O>(f: F) -> TypedFnHandler<F, I, O>
where
    F: Fn(I, &InvocationContext) -> Result<O, HandlerError> + Send + Sync,
    I: DeserializeOwned,
    O: Serialize,
{
    TypedFnHandler {
        f,
        _types: PhantomData,
    }
}

#[async_trait]
impl<F, I, O> Handler for TypedFnHandler<F, I, O>
where
    F: Fn(I, &InvocationContext) -> Result<O, HandlerError> + Send + Sync,
    I: DeserializeOwned,
    O: Serialize,
{
    async fn call(&self, event: Value, context: &InvocationContext) -> Result<Value, HandlerError> {
        let input: I = serde_json::from_value(event)?;
        let output = (self.f)(input, context)?;
        Ok(serde_json::to_value(output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn ctx() -> InvocationContext {
        InvocationContext::new("req-1", i64::MAX)
    }

    #[tokio::test]
    async fn fn_handler_passes_event_through() {
        let h = handler_fn(|event, ctx| Ok(json!({"echo": event, "id": ctx.request_id})));
        let out = h.call(json!({"a": 1}), &ctx()).await.unwrap();
        assert_eq!(out, json!({"echo": {"a": 1}, "id": "req-1"}));
    }

    #[derive(Deserialize)]
    struct Add {
        a: i64,
        b: i64,
    }

    #[tokio::test]
    async fn typed_handler_decodes_input() {
        let h = typed_handler_fn(|input: Add, _ctx: &InvocationContext| Ok(input.a + input.b));
        assert_eq!(h.call(json!({"a": 2, "b": 3}), &ctx()).await.unwrap(), json!(5));

        let err = h.call(json!({"a": "x"}), &ctx()).await.unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    }

    #[test]
    fn handler_error_converts_to_runtime_error() {
        let err: RuntimeError = HandlerError::value_error("bad").with_frame("at step 1").into();
        match err {
            RuntimeError::HandlerExecutionError {
                kind, stack_trace, ..
            } => {
                assert_eq!(kind, "ValueError");
                assert_eq!(stack_trace, vec!["at step 1".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let fatal: RuntimeError = HandlerError::fatal("out of memory").into();
        assert_eq!(fatal.exit_code(), 2);
    }
}
