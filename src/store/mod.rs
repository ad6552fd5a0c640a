//! # Tabular Data Store
//!
//! The store of record for reference tables and persons. Handlers only see
//! the [`PopulationStore`] trait; the pool (or the in-memory tables) is
//! built once at startup and shared through router state.
//!
//! - [`PgStore`]: PostgreSQL over a `sqlx` connection pool
//! - [`MemoryStore`]: `RwLock`-guarded tables for tests and local runs

mod errors;
mod memory;
mod postgres;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::model::{CodeInfo, CodeKey, NewPerson, Person, ReferenceRow, ReferenceTable};
use crate::stats::FilterClause;

/// Raw age aggregate over a filtered population. Every field is `None`
/// when no row matched; `stddev` is also `None` for a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
pub struct AgeSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

/// Row fetch / insert / update / delete primitives plus the two aggregate
/// queries used by the statistics endpoints.
#[async_trait]
pub trait PopulationStore: Send + Sync {
    /// Every row of a reference table, ordered by id
    async fn list_references(&self, table: ReferenceTable) -> StoreResult<Vec<ReferenceRow>>;

    /// One reference row by id
    async fn get_reference(&self, table: ReferenceTable, id: i32)
        -> StoreResult<Option<ReferenceRow>>;

    /// `{code, name}` pairs of a reference table, ordered by code
    async fn list_codes(&self, table: ReferenceTable) -> StoreResult<Vec<CodeInfo>>;

    /// Point lookup of the id owning `code`
    async fn lookup_key(&self, table: ReferenceTable, code: &CodeKey) -> StoreResult<Option<i32>>;

    /// Every person, ordered by id, with age derived at read time
    async fn list_persons(&self) -> StoreResult<Vec<Person>>;

    async fn get_person(&self, id: i32) -> StoreResult<Option<Person>>;

    /// Insert and return the stored row. Unknown foreign keys are a
    /// [`StoreError::Conflict`].
    async fn insert_person(&self, person: &NewPerson) -> StoreResult<Person>;

    /// Replace every column of an existing person; `None` if absent
    async fn update_person(&self, id: i32, person: &NewPerson) -> StoreResult<Option<Person>>;

    /// `true` if a row was removed
    async fn delete_person(&self, id: i32) -> StoreResult<bool>;

    /// Number of persons matching `clause` (all persons when empty)
    async fn count_persons(&self, clause: &FilterClause) -> StoreResult<i64>;

    /// MIN / MAX / AVG / sample STDDEV of derived age over `clause`
    async fn age_summary(&self, clause: &FilterClause) -> StoreResult<AgeSummary>;

    /// Date ages are derived against. Writes are validated against it so
    /// a stored birthdate never yields a negative age.
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> StoreResult<()>;

    /// Release pooled resources. Called once during shutdown.
    async fn close(&self);
}
