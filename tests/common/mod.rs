//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use isekai_api::http_server::{HttpServer, HttpServerConfig};
use isekai_api::model::{CodeInfo, CodeKey, NewPerson, Person, ReferenceRow, ReferenceTable};
use isekai_api::stats::FilterClause;
use isekai_api::store::{AgeSummary, MemoryStore, PopulationStore, StoreError, StoreResult};

pub const HUMAN: i32 = 1;
pub const ELF: i32 = 2;
pub const MALE: i32 = 1;
pub const FEMALE: i32 = 2;
pub const PLEBE: i32 = 1;
pub const NOBLEZA: i32 = 2;
pub const REALEZA: i32 = 3;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn person(age: i32, species: i32, strata: i32, gender: i32) -> NewPerson {
    NewPerson {
        name: format!("resident-{}", age),
        birthdate: NaiveDate::from_ymd_opt(2025 - age, 1, 15).unwrap(),
        gender_fk: gender,
        species_fk: species,
        strata_fk: strata,
    }
}

/// Reference tables only, no persons
pub fn reference_store() -> MemoryStore {
    MemoryStore::new()
        .with_today(today())
        .with_reference(ReferenceTable::Species, HUMAN, "HU", "Humano")
        .with_reference(ReferenceTable::Species, ELF, "EL", "Elfo")
        .with_reference(ReferenceTable::Genders, MALE, "M", "Masculino")
        .with_reference(ReferenceTable::Genders, FEMALE, "F", "Femenino")
        .with_reference(ReferenceTable::Strata, REALEZA, "10", "Realeza")
        .with_reference(ReferenceTable::Strata, NOBLEZA, "5", "Nobleza")
        .with_reference(ReferenceTable::Strata, PLEBE, "0", "Plebe")
}

/// Five persons: three human men aged 20, 20 and 22, a human woman of 40
/// and an elf woman of 300
pub fn census_store() -> MemoryStore {
    reference_store()
        .with_person(person(20, HUMAN, PLEBE, MALE))
        .with_person(person(20, HUMAN, PLEBE, MALE))
        .with_person(person(22, HUMAN, NOBLEZA, MALE))
        .with_person(person(40, HUMAN, NOBLEZA, FEMALE))
        .with_person(person(300, ELF, REALEZA, FEMALE))
}

pub fn router(store: impl PopulationStore + 'static) -> Router {
    HttpServer::with_config(HttpServerConfig::default(), Arc::new(store)).router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri, None).await
}

/// Every operation fails with the same store error
pub struct FailingStore {
    error: StoreError,
}

impl FailingStore {
    /// As if the database could not be reached
    pub fn unreachable() -> Self {
        Self {
            error: StoreError::Connection(
                "connection refused (os error 111) at 10.0.0.7:5432".to_string(),
            ),
        }
    }

    /// As if every write tripped a foreign key constraint
    pub fn conflict(message: &str) -> Self {
        Self {
            error: StoreError::Conflict(message.to_string()),
        }
    }

    fn fail<T>(&self) -> StoreResult<T> {
        Err(self.error.clone())
    }
}

#[async_trait]
impl PopulationStore for FailingStore {
    async fn list_references(&self, _table: ReferenceTable) -> StoreResult<Vec<ReferenceRow>> {
        self.fail()
    }

    async fn get_reference(
        &self,
        _table: ReferenceTable,
        _id: i32,
    ) -> StoreResult<Option<ReferenceRow>> {
        self.fail()
    }

    async fn list_codes(&self, _table: ReferenceTable) -> StoreResult<Vec<CodeInfo>> {
        self.fail()
    }

    async fn lookup_key(&self, _table: ReferenceTable, _code: &CodeKey) -> StoreResult<Option<i32>> {
        self.fail()
    }

    async fn list_persons(&self) -> StoreResult<Vec<Person>> {
        self.fail()
    }

    async fn get_person(&self, _id: i32) -> StoreResult<Option<Person>> {
        self.fail()
    }

    async fn insert_person(&self, _person: &NewPerson) -> StoreResult<Person> {
        self.fail()
    }

    async fn update_person(&self, _id: i32, _person: &NewPerson) -> StoreResult<Option<Person>> {
        self.fail()
    }

    async fn delete_person(&self, _id: i32) -> StoreResult<bool> {
        self.fail()
    }

    async fn count_persons(&self, _clause: &FilterClause) -> StoreResult<i64> {
        self.fail()
    }

    async fn age_summary(&self, _clause: &FilterClause) -> StoreResult<AgeSummary> {
        self.fail()
    }

    async fn ping(&self) -> StoreResult<()> {
        self.fail()
    }

    async fn close(&self) {}
}
