//! Statistics HTTP Routes
//!
//! `GET /v1/stats/count` and `GET /v1/stats/age`, both filtered by the
//! optional `speciesCode`, `strataCode` and `genderCode` query parameters.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use super::problem::{ApiError, ApiResult};
use super::state::AppState;
use crate::observability::Logger;
use crate::stats::{self, AgeStat, CountStat, FilterRequest, StatsError};

/// Create statistics routes, to be nested under `/v1`
pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats/count", get(count_handler))
        .route("/stats/age", get(age_handler))
}

fn filters(query: Result<Query<FilterRequest>, QueryRejection>) -> ApiResult<FilterRequest> {
    query
        .map(|Query(filters)| filters)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn classify(state: &AppState, err: StatsError) -> ApiError {
    if let StatsError::UnknownCode { dimension, code } = &err {
        state.metrics.increment_unresolved_codes();
        Logger::warn(
            "UNKNOWN_FILTER_CODE",
            &[("code", code.as_str()), ("parameter", dimension.query_param())],
        );
    }
    err.into()
}

async fn count_handler(
    State(state): State<AppState>,
    query: Result<Query<FilterRequest>, QueryRejection>,
) -> ApiResult<Json<CountStat>> {
    let filters = filters(query)?;
    state.metrics.increment_count_queries();
    stats::count_stats(state.store.as_ref(), &filters)
        .await
        .map(Json)
        .map_err(|err| classify(&state, err))
}

async fn age_handler(
    State(state): State<AppState>,
    query: Result<Query<FilterRequest>, QueryRejection>,
) -> ApiResult<Json<AgeStat>> {
    let filters = filters(query)?;
    state.metrics.increment_age_queries();
    stats::age_stats(state.store.as_ref(), &filters)
        .await
        .map(Json)
        .map_err(|err| classify(&state, err))
}
