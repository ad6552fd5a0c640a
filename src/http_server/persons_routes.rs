//! Person HTTP Routes
//!
//! CRUD over `persons`. Bodies are validated against the store's
//! evaluation date before reaching the store; unknown foreign keys come
//! back from the store as conflicts and are reported as 400.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::problem::{ApiError, ApiResult};
use super::reference_routes::path_id;
use super::state::AppState;
use crate::model::{NewPerson, Person};

/// Create person routes, to be nested under `/v1`
pub fn persons_routes() -> Router<AppState> {
    Router::new()
        .route("/persons", get(list_persons).post(create_person))
        .route(
            "/persons/:id",
            get(get_person).put(update_person).delete(delete_person),
        )
}

fn person_body(
    state: &AppState,
    body: Result<Json<NewPerson>, JsonRejection>,
) -> ApiResult<NewPerson> {
    let Json(person) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    person.validate(state.store.today())?;
    Ok(person)
}

fn person_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("person {} not found", id))
}

async fn list_persons(State(state): State<AppState>) -> ApiResult<Json<Vec<Person>>> {
    Ok(Json(state.store.list_persons().await?))
}

async fn get_person(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Person>> {
    let id = path_id(id)?;
    state
        .store
        .get_person(id)
        .await?
        .map(Json)
        .ok_or_else(|| person_not_found(id))
}

async fn create_person(
    State(state): State<AppState>,
    body: Result<Json<NewPerson>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let person = person_body(&state, body)?;
    let created = state.store.insert_person(&person).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_person(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<NewPerson>, JsonRejection>,
) -> ApiResult<Json<Person>> {
    let id = path_id(id)?;
    let person = person_body(&state, body)?;
    state
        .store
        .update_person(id, &person)
        .await?
        .map(Json)
        .ok_or_else(|| person_not_found(id))
}

async fn delete_person(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(id)?;
    if state.store.delete_person(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(person_not_found(id))
    }
}
