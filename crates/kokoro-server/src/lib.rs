mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, response::IntoResponse};
use kokoro_config::Config;
use tower_http::trace::TraceLayer;

pub use health::HealthResponse;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a preloaded pipeline cannot be created
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let tts_state = tts::build_server(config).await?;
        Ok(Self::from_parts(config, tts_state))
    }

    /// Build the server around an already constructed speech service
    pub fn from_parts(config: &Config, tts_state: Arc<tts::Server>) -> Self {
        let listen_address = config.server.listen_address;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            let health_state = health::HealthState {
                tts: Arc::clone(&tts_state),
                port: listen_address.port(),
            };
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler).with_state(health_state),
            );
        }

        // Speech and voice routes
        app = app.merge(tts::endpoint_router().with_state(tts_state));

        // Unknown paths and known paths with the wrong method look the same
        app = app.method_not_allowed_fallback(not_found).fallback(not_found);

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS, outermost so error responses carry the headers too
        app = app.layer(cors::cors_layer(&config.server.cors));

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

async fn not_found() -> axum::response::Response {
    tts::TtsError::NotFound.into_response()
}
