//! # Problem Responses
//!
//! HTTP boundary errors rendered as `application/problem+json`.
//!
//! `ApiError::into_response` writes a complete envelope without request
//! context and attaches the error to the response extensions. The request
//! middleware then re-renders it with the request path as `instance` and
//! the configured `type` base.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::InvalidPerson;
use crate::observability::Logger;
use crate::stats::StatsError;
use crate::store::StoreError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

const ABOUT_BLANK: &str = "about:blank";

/// Detail of a write rejected by a foreign key or unique constraint. The
/// driver message names tables and constraints and is only logged.
pub const CONFLICT_DETAIL: &str = "a referenced gender, species or stratum does not exist";

/// Errors surfaced to HTTP clients
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Missing row or empty population
    #[error("{0}")]
    NotFound(String),

    /// Unresolvable filter code or rejected request body
    #[error("{detail}")]
    BadRequest {
        detail: String,
        parameter: Option<String>,
    },

    #[error("request timed out")]
    Timeout,

    /// Store failure. Detail is never exposed.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        ApiError::BadRequest {
            detail: detail.into(),
            parameter: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not-found",
            ApiError::BadRequest { .. } => "bad-request",
            ApiError::Timeout => "timeout",
            ApiError::Internal => "internal-error",
        }
    }

    /// Build the envelope for a request to `instance`
    pub fn problem(&self, instance: &str, base_uri: &str) -> ProblemDetails {
        let status = self.status_code();
        let problem_type = if base_uri.is_empty() || base_uri == ABOUT_BLANK {
            ABOUT_BLANK.to_string()
        } else {
            format!("{}/{}", base_uri.trim_end_matches('/'), self.slug())
        };

        let mut properties = Map::new();
        if let ApiError::BadRequest {
            parameter: Some(parameter),
            ..
        } = self
        {
            properties.insert("parameter".to_string(), Value::String(parameter.clone()));
        }

        ProblemDetails {
            problem_type,
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: self.to_string(),
            instance: instance.to_string(),
            properties,
        }
    }
}

/// RFC 7807 problem envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(_) => return status.into_response(),
        };
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.problem("", ABOUT_BLANK).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(cause) => {
                Logger::warn("STORE_CONFLICT", &[("cause", cause.as_str())]);
                ApiError::bad_request(CONFLICT_DETAIL)
            }
            other => {
                let cause = other.to_string();
                Logger::error("STORE_FAILURE", &[("cause", cause.as_str())]);
                ApiError::Internal
            }
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::UnknownCode { dimension, .. } => ApiError::BadRequest {
                detail: err.to_string(),
                parameter: Some(dimension.query_param().to_string()),
            },
            StatsError::Empty => ApiError::NotFound(err.to_string()),
            StatsError::Store(store) => store.into(),
        }
    }
}

impl From<InvalidPerson> for ApiError {
    fn from(err: InvalidPerson) -> Self {
        ApiError::bad_request(err.to_string())
    }
}
