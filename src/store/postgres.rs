//! PostgreSQL-backed store.
//!
//! Dynamic SQL is limited to table and column names taken from
//! [`ReferenceTable`] and [`Dimension`](crate::model::Dimension); every
//! caller-supplied value is bound as a positional parameter.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use super::{AgeSummary, PopulationStore, StoreResult};
use crate::config::DatabaseConfig;
use crate::model::{CodeInfo, CodeKey, NewPerson, Person, ReferenceRow, ReferenceTable};
use crate::stats::FilterClause;

/// Columns of a person row, with age derived at query time
const PERSON_COLUMNS: &str = "id, name, birthdate, \
     date_part('year', age(birthdate))::int AS age, \
     gender_fk, species_fk, strata_fk";

/// Store over a shared `sqlx` connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the pool and open `pool_min` connections.
    ///
    /// Callers beyond `pool_max` queue for up to `acquire_timeout_ms`; each
    /// connection carries `statement_timeout` so a stuck query is cancelled
    /// server-side.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn list_references_sql(table: ReferenceTable) -> String {
    format!(
        "SELECT id, code::text AS code, name FROM {} ORDER BY id",
        table.table_name()
    )
}

fn get_reference_sql(table: ReferenceTable) -> String {
    format!(
        "SELECT id, code::text AS code, name FROM {} WHERE id = $1",
        table.table_name()
    )
}

// qualified ORDER BY so strata sort on the integer column, not the text alias
fn list_codes_sql(table: ReferenceTable) -> String {
    let t = table.table_name();
    format!("SELECT code::text AS code, name FROM {t} ORDER BY {t}.code")
}

fn lookup_key_sql(table: ReferenceTable) -> String {
    format!("SELECT id FROM {} WHERE code = $1", table.table_name())
}

fn count_sql(clause: &FilterClause) -> String {
    format!("SELECT COUNT(*) FROM persons{}", clause.where_sql())
}

fn age_summary_sql(clause: &FilterClause) -> String {
    format!(
        "SELECT MIN(age)::float8 AS min, MAX(age)::float8 AS max, \
         AVG(age)::float8 AS mean, STDDEV_SAMP(age)::float8 AS stddev \
         FROM (SELECT date_part('year', age(birthdate)) AS age FROM persons{}) AS ages",
        clause.where_sql()
    )
}

#[async_trait]
impl PopulationStore for PgStore {
    async fn list_references(&self, table: ReferenceTable) -> StoreResult<Vec<ReferenceRow>> {
        let rows = sqlx::query_as::<_, ReferenceRow>(&list_references_sql(table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_reference(
        &self,
        table: ReferenceTable,
        id: i32,
    ) -> StoreResult<Option<ReferenceRow>> {
        let row = sqlx::query_as::<_, ReferenceRow>(&get_reference_sql(table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_codes(&self, table: ReferenceTable) -> StoreResult<Vec<CodeInfo>> {
        let rows = sqlx::query_as::<_, CodeInfo>(&list_codes_sql(table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn lookup_key(&self, table: ReferenceTable, code: &CodeKey) -> StoreResult<Option<i32>> {
        let sql = lookup_key_sql(table);
        let query = sqlx::query_scalar::<_, i32>(&sql);
        let query = match code {
            CodeKey::Text(text) => query.bind(text.as_str()),
            CodeKey::Number(n) => query.bind(*n),
        };
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn list_persons(&self) -> StoreResult<Vec<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id");
        let rows = sqlx::query_as::<_, Person>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_person(&self, id: i32) -> StoreResult<Option<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = $1");
        let row = sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_person(&self, person: &NewPerson) -> StoreResult<Person> {
        let sql = format!(
            "INSERT INTO persons (name, birthdate, gender_fk, species_fk, strata_fk) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PERSON_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Person>(&sql)
            .bind(&person.name)
            .bind(person.birthdate)
            .bind(person.gender_fk)
            .bind(person.species_fk)
            .bind(person.strata_fk)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_person(&self, id: i32, person: &NewPerson) -> StoreResult<Option<Person>> {
        let sql = format!(
            "UPDATE persons SET name = $1, birthdate = $2, gender_fk = $3, \
             species_fk = $4, strata_fk = $5 WHERE id = $6 RETURNING {PERSON_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Person>(&sql)
            .bind(&person.name)
            .bind(person.birthdate)
            .bind(person.gender_fk)
            .bind(person.species_fk)
            .bind(person.strata_fk)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_person(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_persons(&self, clause: &FilterClause) -> StoreResult<i64> {
        let sql = count_sql(clause);
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for key in clause.params() {
            query = query.bind(key);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn age_summary(&self, clause: &FilterClause) -> StoreResult<AgeSummary> {
        let sql = age_summary_sql(clause);
        let mut query = sqlx::query_as::<_, AgeSummary>(&sql);
        for key in clause.params() {
            query = query.bind(key);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimension;

    #[test]
    fn test_reference_sql_uses_fixed_table_names() {
        assert_eq!(
            list_references_sql(ReferenceTable::Genders),
            "SELECT id, code::text AS code, name FROM genders ORDER BY id"
        );
        assert_eq!(
            lookup_key_sql(ReferenceTable::Strata),
            "SELECT id FROM strata WHERE code = $1"
        );
    }

    #[test]
    fn test_codes_ordered_by_source_column() {
        assert_eq!(
            list_codes_sql(ReferenceTable::Strata),
            "SELECT code::text AS code, name FROM strata ORDER BY strata.code"
        );
    }

    #[test]
    fn test_count_sql_without_filters() {
        assert_eq!(
            count_sql(&FilterClause::default()),
            "SELECT COUNT(*) FROM persons"
        );
    }

    #[test]
    fn test_count_sql_binds_filters_in_order() {
        let clause = FilterClause::from_keys(&[(Dimension::Species, 3), (Dimension::Gender, 2)]);
        assert_eq!(
            count_sql(&clause),
            "SELECT COUNT(*) FROM persons WHERE species_fk = $1 AND gender_fk = $2"
        );
    }

    #[test]
    fn test_age_summary_sql_filters_inner_select() {
        let clause = FilterClause::from_keys(&[(Dimension::Strata, 5)]);
        let sql = age_summary_sql(&clause);
        assert!(sql.contains("STDDEV_SAMP(age)"));
        assert!(sql.ends_with("FROM persons WHERE strata_fk = $1) AS ages"));
    }
}
