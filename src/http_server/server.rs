//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use super::config::HttpServerConfig;
use super::middleware::track_request;
use super::observability_routes::{health_routes, observability_routes};
use super::persons_routes::persons_routes;
use super::reference_routes::reference_routes;
use super::state::AppState;
use super::stats_routes::stats_routes;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::store::PopulationStore;

/// HTTP server for the population API
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
    router: Router,
}

impl HttpServer {
    /// Create a server over `store`
    pub fn with_config(config: HttpServerConfig, store: Arc<dyn PopulationStore>) -> Self {
        let state = AppState::new(store, &config.problem_base_uri);
        let router = Self::build_router(&config, state.clone());
        Self {
            config,
            state,
            router,
        }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let v1 = Router::new()
            .merge(reference_routes())
            .merge(persons_routes())
            .merge(stats_routes());

        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes())
            .nest("/v1", v1)
            // innermost: the request tracker must see the 408
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(from_fn_with_state(state.clone(), track_request))
            .layer(cors)
            .with_state(state)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Shared state, for inspecting counters
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until Ctrl-C or SIGTERM
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?.to_string();
        log_event_with_fields(Event::Serving, &[("addr", local.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        // if the handler cannot be installed, only SIGTERM stops the server
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log_event(Event::ShutdownStart);
}
