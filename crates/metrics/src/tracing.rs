use geo_runtime_models::{HandlerId, LogConfig, LogFormat};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` wins over the configured level.
    pub fn init(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))?;

        match config.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
                .with_current_span(false)
                .try_init()?,
            LogFormat::Pretty => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .try_init()?,
        }

        Ok(())
    }

    pub fn log_handler_resolved(handler: &HandlerId, init_duration_ms: f64) {
        info!(
            handler = %handler,
            init_duration_ms = init_duration_ms,
            "Handler ready"
        );
    }

    pub fn log_resolution_failed(handler: &str, error_type: &str, error_message: &str) {
        error!(
            handler = %handler,
            error_type = %error_type,
            error_message = %error_message,
            "Handler resolution failed"
        );
    }

    pub fn log_invocation_started(handler: &HandlerId, request_id: &str, is_cold_start: bool) {
        info!(
            handler = %handler,
            request_id = %request_id,
            is_cold_start = is_cold_start,
            "Invocation started"
        );
    }

    pub fn log_invocation_completed(handler: &HandlerId, request_id: &str, duration_ms: f64) {
        info!(
            handler = %handler,
            request_id = %request_id,
            duration_ms = duration_ms,
            "Invocation completed"
        );
    }

    pub fn log_invocation_failed(
        handler: &HandlerId,
        request_id: &str,
        duration_ms: f64,
        error_type: &str,
        error_message: &str,
    ) {
        warn!(
            handler = %handler,
            request_id = %request_id,
            duration_ms = duration_ms,
            error_type = %error_type,
            error_message = %error_message,
            "Invocation failed"
        );
    }

    pub fn log_fatal(handler: &HandlerId, request_id: &str, error_message: &str) {
        error!(
            handler = %handler,
            request_id = %request_id,
            error_message = %error_message,
            "Fatal resource error, terminating runtime"
        );
    }

    pub fn log_shutdown(served: u64, succeeded: u64, failed: u64) {
        info!(
            served = served,
            succeeded = succeeded,
            failed = failed,
            "Runtime shutting down"
        );
    }
}
