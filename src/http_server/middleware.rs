//! Request middleware
//!
//! One `HTTP_REQUEST` log line per request, response counters, the
//! `x-request-id` header and final rendering of problem responses.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::problem::ApiError;
use super::state::AppState;
use crate::observability::Logger;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    // The timeout layer answers with a bare 408
    let problem = match response.extensions().get::<ApiError>() {
        Some(err) => Some(err.clone()),
        None if response.status() == StatusCode::REQUEST_TIMEOUT => Some(ApiError::Timeout),
        None => None,
    };
    if let Some(err) = problem {
        if err == ApiError::Internal {
            state.metrics.increment_store_failures();
        }
        response = err.problem(&path, &state.problem_base_uri).into_response();
    }

    let status = response.status();
    state.metrics.record_response(status);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let latency_ms = started.elapsed().as_millis().to_string();
    Logger::info(
        "HTTP_REQUEST",
        &[
            ("latency_ms", latency_ms.as_str()),
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("request_id", request_id.as_str()),
            ("status", status.as_str()),
        ],
    );

    response
}
