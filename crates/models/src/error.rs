use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure descriptor returned to the platform when an invocation fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<Vec<String>>,
}

impl ErrorShape {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: Vec<String>) -> Self {
        if !stack_trace.is_empty() {
            self.stack_trace = Some(stack_trace);
        }
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Invalid handler identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Handler module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("Handler function '{function}' not found in module {module}")]
    FunctionNotFound { module: String, function: String },

    #[error("Handler module {module} failed to initialize: {message}")]
    ModuleInitFailed { module: String, message: String },
}

impl ResolutionError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ResolutionError::InvalidIdentifier { .. } => "Runtime.MalformedHandlerName",
            ResolutionError::ModuleNotFound { .. } => "Runtime.ImportModuleError",
            ResolutionError::FunctionNotFound { .. } => "Runtime.HandlerNotFound",
            ResolutionError::ModuleInitFailed { .. } => "Runtime.InitError",
        }
    }
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Handler resolution failed: {0}")]
    ResolutionError(#[from] ResolutionError),

    #[error("{kind}: {message}")]
    HandlerExecutionError {
        kind: String,
        message: String,
        stack_trace: Vec<String>,
    },

    #[error("Fatal resource error: {message}")]
    FatalResourceError { message: String },

    #[error("Transport error: {reason}")]
    TransportError { reason: String },
}

impl RuntimeError {
    pub fn to_error_shape(&self) -> ErrorShape {
        match self {
            RuntimeError::HandlerExecutionError {
                kind,
                message,
                stack_trace,
            } => ErrorShape::new(kind.clone(), message.clone())
                .with_stack_trace(stack_trace.clone()),
            RuntimeError::ResolutionError(e) => ErrorShape::new(e.error_type(), e.to_string()),
            other => ErrorShape::new(other.error_type(), other.to_string()),
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            RuntimeError::ConfigError { .. } => "Runtime.ConfigError",
            RuntimeError::ResolutionError(e) => e.error_type(),
            RuntimeError::HandlerExecutionError { kind, .. } => kind,
            RuntimeError::FatalResourceError { .. } => "FatalResourceError",
            RuntimeError::TransportError { .. } => "Runtime.TransportError",
        }
    }

    /// Process exit code when this error ends the runtime.
    pub fn exit_code(&self) -> u8 {
        match self {
            RuntimeError::ConfigError { .. } => 1,
            RuntimeError::ResolutionError(_) => 1,
            RuntimeError::HandlerExecutionError { .. } => 1,
            RuntimeError::FatalResourceError { .. } => 2,
            RuntimeError::TransportError { .. } => 3,
        }
    }

    pub fn transport(reason: impl ToString) -> Self {
        RuntimeError::TransportError {
            reason: reason.to_string(),
        }
    }
}

impl From<figment::Error> for RuntimeError {
    fn from(e: figment::Error) -> Self {
        RuntimeError::ConfigError {
            reason: e.to_string(),
        }
    }
}
