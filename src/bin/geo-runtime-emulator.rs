use anyhow::Result;
use clap::Parser;
use geo_runtime_api::{start_server, EmulatorConfig};
use geo_runtime_metrics::TracingService;
use geo_runtime_models::{LogConfig, LogFormat};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "geo-runtime-emulator")]
#[command(about = "Local Runtime API emulator for geo-runtime")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
    /// Port to listen on
    #[arg(long, default_value = "9001")]
    port: u16,
    /// Name of the single function served
    #[arg(long, default_value = "geo-runtime")]
    function_name: String,
    /// Per-invocation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,
    /// Log level filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingService::init(&LogConfig {
        level: cli.log_level.clone(),
        format: LogFormat::Pretty,
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    let config = EmulatorConfig {
        bind: cli.bind,
        port: cli.port,
        function_name: cli.function_name,
        timeout_ms: cli.timeout_ms,
    };
    info!(
        "Invoke with: curl -d '{{\"op\":\"ping\"}}' http://{}:{}/2015-03-31/functions/{}/invocations",
        config.bind, config.port, config.function_name
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
        }
    };

    start_server(config, shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    info!("geo-runtime emulator shutdown complete");
    Ok(())
}
