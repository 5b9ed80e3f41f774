//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with host hook and admin handlers
//! - Wire up middleware (auth, tracing, request timeout)
//! - Bind server to listener and stop on the shutdown signal

use axum::{middleware, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{auth::admin_auth_middleware, setup_admin_router};
use crate::certificates::TriggerSurface;
use crate::config::RegistrarConfig;
use crate::http::attempts::complete_attempt;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub triggers: Arc<TriggerSurface>,
    pub api_key: Arc<str>,
}

/// HTTP server exposing the host hook and operator actions.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &RegistrarConfig, triggers: Arc<TriggerSurface>) -> Self {
        let state = AppState {
            triggers,
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &RegistrarConfig, state: AppState) -> Router {
        Router::new()
            .route("/attempts/complete", post(complete_attempt))
            .merge(setup_admin_router())
            .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
