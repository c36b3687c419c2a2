use anyhow::{Context, Result};
use geo_runtime_api::RtState;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// An in-process Runtime API emulator bound to an ephemeral port.
pub struct TestEmulator {
    pub addr: SocketAddr,
    pub state: RtState,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl TestEmulator {
    /// `host:port` as expected in `AWS_LAMBDA_RUNTIME_API`.
    pub fn runtime_api(&self) -> String {
        self.addr.to_string()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Closes the queue and waits for the server to drain.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.server).await.context("emulator task panicked")
    }
}

impl Drop for TestEmulator {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_emulator(function_name: &str, timeout_ms: u64) -> Result<TestEmulator> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = RtState::new(function_name, timeout_ms);
    let (tx, rx) = oneshot::channel::<()>();

    let server_state = state.clone();
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = geo_runtime_api::serve(listener, server_state, shutdown).await {
            eprintln!("test emulator stopped with error: {e}");
        }
    });

    Ok(TestEmulator {
        addr,
        state,
        shutdown: Some(tx),
        server,
    })
}
