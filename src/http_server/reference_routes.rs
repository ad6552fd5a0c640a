//! Reference Table HTTP Routes
//!
//! - `GET /v1/info/{table}`: `{code, name}` pairs ordered by code
//! - `GET /v1/{table}`: full rows ordered by id
//! - `GET /v1/{table}/:id`: one row
//!
//! for each of `genders`, `species` and `strata`.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use super::problem::{ApiError, ApiResult};
use super::state::AppState;
use crate::model::{CodeInfo, ReferenceRow, ReferenceTable};

/// Create reference routes, to be nested under `/v1`
pub fn reference_routes() -> Router<AppState> {
    let mut router = Router::new();
    for table in ReferenceTable::ALL {
        let name = table.table_name();
        router = router
            .route(
                &format!("/info/{}", name),
                get(move |State(state): State<AppState>| list_codes(state, table)),
            )
            .route(
                &format!("/{}", name),
                get(move |State(state): State<AppState>| list_rows(state, table)),
            )
            .route(
                &format!("/{}/:id", name),
                get(
                    move |State(state): State<AppState>, id: Result<Path<i32>, PathRejection>| {
                        get_row(state, table, id)
                    },
                ),
            );
    }
    router
}

/// Extract a numeric path id, rejecting anything else as a problem response
pub(crate) fn path_id(id: Result<Path<i32>, PathRejection>) -> ApiResult<i32> {
    id.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn list_codes(state: AppState, table: ReferenceTable) -> ApiResult<Json<Vec<CodeInfo>>> {
    let codes = state.store.list_codes(table).await?;
    if codes.is_empty() {
        return Err(ApiError::NotFound(format!("no {} codes are defined", table)));
    }
    Ok(Json(codes))
}

async fn list_rows(state: AppState, table: ReferenceTable) -> ApiResult<Json<Vec<ReferenceRow>>> {
    Ok(Json(state.store.list_references(table).await?))
}

async fn get_row(
    state: AppState,
    table: ReferenceTable,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<ReferenceRow>> {
    let id = path_id(id)?;
    state
        .store
        .get_reference(table, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("{} {} not found", table.entity_name(), id)))
}
