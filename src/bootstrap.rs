use std::future::Future;
use std::time::Instant;

use geo_runtime_dispatcher::{Dispatcher, ServeSummary, Transport};
use geo_runtime_loader::{HandlerRef, HandlerRegistry, Loader};
use geo_runtime_metrics::{RuntimeMetrics, TracingService};
use geo_runtime_models::RuntimeError;
use tracing::{info, warn};

/// Resolves a handler and drives a [`Dispatcher`] over a transport.
pub struct Bootstrap {
    loader: Loader,
    metrics: Option<RuntimeMetrics>,
}

impl Bootstrap {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            loader: Loader::new(registry),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: RuntimeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Resolves `handler` once. Failures are reported to the transport as an
    /// init error before being returned.
    pub async fn init<T>(&self, handler: &str, transport: &mut T) -> Result<HandlerRef, RuntimeError>
    where
        T: Transport + ?Sized,
    {
        let start = Instant::now();
        match self.loader.resolve_str(handler) {
            Ok(handler_ref) => {
                let init_ms = start.elapsed().as_secs_f64() * 1000.0;
                if let Some(metrics) = &self.metrics {
                    metrics.record_init_duration(init_ms);
                }
                TracingService::log_handler_resolved(handler_ref.id(), init_ms);
                Ok(handler_ref)
            }
            Err(e) => {
                let err = RuntimeError::from(e);
                let shape = err.to_error_shape();
                TracingService::log_resolution_failed(handler, &shape.error, &shape.message);
                if let Err(report) = transport.report_init_error(&shape).await {
                    warn!(error = %report, "Failed to report init error");
                }
                Err(err)
            }
        }
    }

    /// Initializes the handler and serves until the stream ends or `shutdown`
    /// resolves while idle.
    pub async fn run<T, S>(
        &self,
        handler: &str,
        transport: &mut T,
        shutdown: S,
    ) -> Result<ServeSummary, RuntimeError>
    where
        T: Transport + ?Sized,
        S: Future<Output = ()>,
    {
        let handler_ref = self.init(handler, transport).await?;

        let mut dispatcher = Dispatcher::new(handler_ref);
        if let Some(metrics) = &self.metrics {
            dispatcher = dispatcher.with_metrics(metrics.clone());
        }

        let result = dispatcher.serve(transport, shutdown).await;
        let summary = dispatcher.summary();
        TracingService::log_shutdown(summary.served, summary.succeeded, summary.failed);
        if let Err(e) = &result {
            info!(error_type = %e.error_type(), exit_code = e.exit_code(), "Runtime stopping on error");
        }
        result
    }
}

/// Shorthand for `Bootstrap::new(registry).run(..)` without metrics.
pub async fn run<T, S>(
    handler: &str,
    registry: HandlerRegistry,
    transport: &mut T,
    shutdown: S,
) -> Result<ServeSummary, RuntimeError>
where
    T: Transport + ?Sized,
    S: Future<Output = ()>,
{
    Bootstrap::new(registry).run(handler, transport, shutdown).await
}
