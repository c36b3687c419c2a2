use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use geo_runtime_loader::{HandlerError, HandlerRef};
use geo_runtime_metrics::{RuntimeMetrics, TracingService};
use geo_runtime_models::{ErrorShape, InvocationRequest, InvocationResponse, RuntimeError};
use tracing::{info, warn};

use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Executing { request_id: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    pub served: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Serves invocations one at a time against a single resolved handler.
pub struct Dispatcher {
    handler: HandlerRef,
    metrics: Option<RuntimeMetrics>,
    state: DispatcherState,
    summary: ServeSummary,
}

impl Dispatcher {
    pub fn new(handler: HandlerRef) -> Self {
        Self {
            handler,
            metrics: None,
            state: DispatcherState::Idle,
            summary: ServeSummary::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: RuntimeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn state(&self) -> &DispatcherState {
        &self.state
    }

    pub fn summary(&self) -> ServeSummary {
        self.summary
    }

    /// Runs the handler for one request.
    ///
    /// Handler errors and panics become failure responses. Only a fatal
    /// resource error is returned as `Err`; the caller must still answer the
    /// invocation and then stop serving.
    pub async fn dispatch(
        &mut self,
        request: InvocationRequest,
    ) -> Result<InvocationResponse, RuntimeError> {
        let InvocationRequest { payload, context } = request;
        let is_cold_start = self.summary.served == 0;

        self.state = DispatcherState::Executing {
            request_id: context.request_id.clone(),
        };
        TracingService::log_invocation_started(self.handler.id(), &context.request_id, is_cold_start);
        if let Some(metrics) = &self.metrics {
            metrics.record_invocation();
            if is_cold_start {
                metrics.record_cold_start();
            }
        }

        let start = Instant::now();
        let outcome = AssertUnwindSafe(self.handler.call(payload, &context))
            .catch_unwind()
            .await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.state = DispatcherState::Idle;
        self.summary.served += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_duration(duration_ms);
        }

        let shape = match outcome {
            Ok(Ok(value)) => {
                self.summary.succeeded += 1;
                TracingService::log_invocation_completed(
                    self.handler.id(),
                    &context.request_id,
                    duration_ms,
                );
                return Ok(InvocationResponse::Success(value));
            }
            Ok(Err(HandlerError::Fatal { message })) => {
                self.summary.failed += 1;
                self.record_error("FatalResourceError");
                TracingService::log_fatal(self.handler.id(), &context.request_id, &message);
                return Err(RuntimeError::FatalResourceError { message });
            }
            Ok(Err(raised)) => RuntimeError::from(raised).to_error_shape(),
            Err(panic) => ErrorShape::new("Panic", panic_message(panic.as_ref())),
        };

        self.summary.failed += 1;
        self.record_error(&shape.error);
        TracingService::log_invocation_failed(
            self.handler.id(),
            &context.request_id,
            duration_ms,
            &shape.error,
            &shape.message,
        );
        Ok(InvocationResponse::Failure(shape))
    }

    /// Pulls invocations from `transport` until the stream ends, `shutdown`
    /// resolves while idle, or a fatal error occurs.
    pub async fn serve<T, S>(
        &mut self,
        transport: &mut T,
        shutdown: S,
    ) -> Result<ServeSummary, RuntimeError>
    where
        T: Transport + ?Sized,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, runtime idle");
                    break;
                }
                next = transport.next_invocation() => next?,
            };

            let Some(request) = next else {
                info!("Invocation stream closed");
                break;
            };

            let request_id = request.context.request_id.clone();
            match self.dispatch(request).await {
                Ok(response) => transport.send_response(&request_id, &response).await?,
                Err(fatal) => {
                    let response = InvocationResponse::Failure(fatal.to_error_shape());
                    if let Err(e) = transport.send_response(&request_id, &response).await {
                        warn!(request_id = %request_id, error = %e, "Failed to report fatal error");
                    }
                    return Err(fatal);
                }
            }
        }

        Ok(self.summary)
    }

    fn record_error(&self, error_type: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(error_type);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
