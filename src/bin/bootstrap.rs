use std::process::ExitCode;

use geo_runtime::Bootstrap;
use geo_runtime_client::RuntimeApiClient;
use geo_runtime_handlers::builtin_registry;
use geo_runtime_metrics::{RuntimeMetrics, TracingService};
use geo_runtime_models::RuntimeConfig;
use tracing::{debug, error, info, warn};

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match RuntimeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = TracingService::init(&config.log) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        handler = %config.handler,
        runtime_api = %config.runtime_api,
        function_name = config.function_name.as_deref().unwrap_or("-"),
        "Starting geo-runtime bootstrap"
    );

    let mut bootstrap = Bootstrap::new(builtin_registry());
    let metrics = match RuntimeMetrics::new() {
        Ok(metrics) => {
            bootstrap = bootstrap.with_metrics(metrics.clone());
            Some(metrics)
        }
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let mut client = RuntimeApiClient::new(&config.runtime_api);
    let result = bootstrap
        .run(&config.handler, &mut client, shutdown_signal())
        .await;

    if let Some(metrics) = metrics {
        match metrics.get_metrics() {
            Ok(text) => debug!(metrics = %text, "Final runtime metrics"),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }

    match result {
        Ok(summary) => {
            info!(served = summary.served, "geo-runtime bootstrap exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error_type = %e.error_type(), "{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
