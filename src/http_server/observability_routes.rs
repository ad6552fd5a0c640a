//! Observability HTTP Routes
//!
//! Welcome message, health check and request counters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::state::AppState;
use crate::observability::{Logger, MetricsSnapshot};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /` response
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// `/` and `/health` at the root
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome_handler))
        .route("/health", get(health_handler))
}

/// Create observability routes, nested under `/observability`
pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn welcome_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Isekai population API".to_string(),
    })
}

/// 200 when the store answers, 503 otherwise
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (code, status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            let cause = err.to_string();
            Logger::warn("HEALTH_CHECK_FAILED", &[("cause", cause.as_str())]);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (code, Json(response))
}

async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "1.0.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
    }
}
