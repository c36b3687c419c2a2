pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::RtState;

use std::future::Future;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct EmulatorConfig {
    pub bind: String,
    pub port: u16,
    pub function_name: String,
    pub timeout_ms: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 9001,
            function_name: "geo-runtime".to_string(),
            timeout_ms: 30000,
        }
    }
}

pub fn build_app(state: RtState) -> Router {
    Router::new().merge(build_router(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// On shutdown the queue is closed so long-polling runtimes receive `410 Gone`.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: RtState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let queue = state.queue.clone();
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            queue.close();
        })
        .await?;
    Ok(())
}

pub async fn start_server(
    config: EmulatorConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = RtState::new(config.function_name.clone(), config.timeout_ms);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.bind, config.port)).await?;
    info!(
        function = %config.function_name,
        "Runtime API emulator listening on {}:{}",
        config.bind, config.port
    );
    serve(listener, state, shutdown).await
}
