//! Test server wrapper that starts the gateway on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use kokoro_config::Config;
use kokoro_server::Server;
use tokio_util::sync::CancellationToken;
use tts::{RecoveryCounter, TtsServerBuilder};

use super::encoder::FakeEncoder;
use super::mock_pipeline::ScriptedFactory;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

/// Build the full router around a scripted backend
pub async fn router(config: &Config, factory: &ScriptedFactory, encoder: &FakeEncoder) -> anyhow::Result<Router> {
    let tts = TtsServerBuilder::new(config)
        .with_pipeline_factory(Arc::new(factory.clone()))
        .with_encoder(Box::new(encoder.clone()))
        .with_recovery_sink(Arc::new(RecoveryCounter::new()))
        .build()
        .await?;

    Ok(Server::from_parts(config, Arc::new(tts)).into_router())
}

impl TestServer {
    /// Start a test server with the given configuration and backend
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config, factory: &ScriptedFactory, encoder: &FakeEncoder) -> anyhow::Result<Self> {
        let router = router(&config, factory, encoder).await?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// URL of `path` on the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
