//! In-memory store.
//!
//! Same contract as the PostgreSQL store, evaluated over `RwLock`-guarded
//! tables. Ages are derived from a fixed evaluation date when one is set,
//! otherwise from today's UTC date.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::{AgeSummary, PopulationStore, StoreError, StoreResult};
use crate::model::{
    age_in_years, CodeInfo, CodeKey, NewPerson, Person, ReferenceRow, ReferenceTable,
};
use crate::stats::FilterClause;

#[derive(Debug, Default)]
struct Tables {
    references: HashMap<ReferenceTable, Vec<ReferenceRow>>,
    persons: BTreeMap<i32, NewPerson>,
    next_person_id: i32,
}

impl Tables {
    fn reference_exists(&self, table: ReferenceTable, id: i32) -> bool {
        self.references
            .get(&table)
            .map_or(false, |rows| rows.iter().any(|r| r.id == id))
    }

    fn check_foreign_keys(&self, person: &NewPerson) -> StoreResult<()> {
        let keys = [
            (ReferenceTable::Genders, "gender_fk", person.gender_fk),
            (ReferenceTable::Species, "species_fk", person.species_fk),
            (ReferenceTable::Strata, "strata_fk", person.strata_fk),
        ];
        for (table, column, id) in keys {
            if !self.reference_exists(table, id) {
                return Err(StoreError::Conflict(format!(
                    "{} {} does not exist in {}",
                    column, id, table
                )));
            }
        }
        Ok(())
    }
}

/// Store over in-process tables
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    today: Option<NaiveDate>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive ages relative to `today` instead of the wall clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Seed a reference row
    pub fn with_reference(
        mut self,
        table: ReferenceTable,
        id: i32,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let tables = self.tables.get_mut().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.references.entry(table).or_default();
        rows.push(ReferenceRow::new(id, code, name));
        rows.sort_by_key(|r| r.id);
        self
    }

    /// Seed a person without foreign key checks
    pub fn with_person(mut self, person: NewPerson) -> Self {
        let tables = self.tables.get_mut().unwrap_or_else(PoisonError::into_inner);
        tables.next_person_id += 1;
        let id = tables.next_person_id;
        tables.persons.insert(id, person);
        self
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    fn materialize(&self, id: i32, person: &NewPerson) -> Person {
        person.clone().into_person(id, self.today())
    }

    fn filtered_ages(&self, clause: &FilterClause) -> StoreResult<Vec<f64>> {
        let today = self.today();
        let tables = self.read()?;
        Ok(tables
            .persons
            .values()
            .filter(|p| clause.matches(p))
            .map(|p| f64::from(age_in_years(p.birthdate, today)))
            .collect())
    }
}

#[async_trait]
impl PopulationStore for MemoryStore {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    async fn list_references(&self, table: ReferenceTable) -> StoreResult<Vec<ReferenceRow>> {
        let tables = self.read()?;
        Ok(tables.references.get(&table).cloned().unwrap_or_default())
    }

    async fn get_reference(
        &self,
        table: ReferenceTable,
        id: i32,
    ) -> StoreResult<Option<ReferenceRow>> {
        let tables = self.read()?;
        Ok(tables
            .references
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| r.id == id).cloned()))
    }

    async fn list_codes(&self, table: ReferenceTable) -> StoreResult<Vec<CodeInfo>> {
        let tables = self.read()?;
        let mut codes: Vec<CodeInfo> = tables
            .references
            .get(&table)
            .map(|rows| rows.iter().map(ReferenceRow::code_info).collect())
            .unwrap_or_default();

        if table.has_numeric_code() {
            codes.sort_by_key(|c| c.code.parse::<i64>().unwrap_or(i64::MAX));
        } else {
            codes.sort_by(|a, b| a.code.cmp(&b.code));
        }
        Ok(codes)
    }

    async fn lookup_key(&self, table: ReferenceTable, code: &CodeKey) -> StoreResult<Option<i32>> {
        let tables = self.read()?;
        Ok(tables
            .references
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| code.matches(&r.code)))
            .map(|r| r.id))
    }

    async fn list_persons(&self) -> StoreResult<Vec<Person>> {
        let tables = self.read()?;
        Ok(tables
            .persons
            .iter()
            .map(|(id, p)| self.materialize(*id, p))
            .collect())
    }

    async fn get_person(&self, id: i32) -> StoreResult<Option<Person>> {
        let tables = self.read()?;
        Ok(tables.persons.get(&id).map(|p| self.materialize(id, p)))
    }

    async fn insert_person(&self, person: &NewPerson) -> StoreResult<Person> {
        let mut tables = self.write()?;
        tables.check_foreign_keys(person)?;
        tables.next_person_id += 1;
        let id = tables.next_person_id;
        tables.persons.insert(id, person.clone());
        Ok(self.materialize(id, person))
    }

    async fn update_person(&self, id: i32, person: &NewPerson) -> StoreResult<Option<Person>> {
        let mut tables = self.write()?;
        if !tables.persons.contains_key(&id) {
            return Ok(None);
        }
        tables.check_foreign_keys(person)?;
        tables.persons.insert(id, person.clone());
        Ok(Some(self.materialize(id, person)))
    }

    async fn delete_person(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.write()?;
        Ok(tables.persons.remove(&id).is_some())
    }

    async fn count_persons(&self, clause: &FilterClause) -> StoreResult<i64> {
        let tables = self.read()?;
        let count = tables
            .persons
            .values()
            .filter(|p| clause.matches(p))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn age_summary(&self, clause: &FilterClause) -> StoreResult<AgeSummary> {
        Ok(summarize(&self.filtered_ages(clause)?))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn close(&self) {}
}

/// MIN / MAX / AVG / STDDEV_SAMP with SQL null semantics
fn summarize(ages: &[f64]) -> AgeSummary {
    if ages.is_empty() {
        return AgeSummary::default();
    }
    let n = ages.len() as f64;
    let min = ages.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = ages.iter().sum::<f64>() / n;
    let stddev = if ages.len() > 1 {
        let variance = ages.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };
    AgeSummary {
        min: Some(min),
        max: Some(max),
        mean: Some(mean),
        stddev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimension;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn person(name: &str, birthdate: NaiveDate, gender: i32) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            birthdate,
            gender_fk: gender,
            species_fk: 1,
            strata_fk: 1,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_today(date(2025, 6, 1))
            .with_reference(ReferenceTable::Genders, 2, "M", "Masculino")
            .with_reference(ReferenceTable::Genders, 1, "F", "Femenino")
            .with_reference(ReferenceTable::Species, 1, "HU", "Humano")
            .with_reference(ReferenceTable::Strata, 1, "10", "Alto")
            .with_reference(ReferenceTable::Strata, 2, "9", "Medio")
            .with_person(person("Emilia", date(2000, 1, 1), 1))
            .with_person(person("Subaru", date(2005, 1, 1), 2))
    }

    #[test]
    fn test_summarize_empty_is_all_null() {
        assert_eq!(summarize(&[]), AgeSummary::default());
    }

    #[test]
    fn test_summarize_single_row_has_null_stddev() {
        let summary = summarize(&[42.0]);
        assert_eq!(summary.min, Some(42.0));
        assert_eq!(summary.stddev, None);
    }

    #[test]
    fn test_summarize_sample_stddev() {
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(summary.mean, Some(5.0));
        // sample variance 32 / 7
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((summary.stddev.unwrap() - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_references_ordered_by_id() {
        let rows = store().list_references(ReferenceTable::Genders).await.unwrap();
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_numeric_codes_sort_numerically() {
        let codes = store().list_codes(ReferenceTable::Strata).await.unwrap();
        let codes: Vec<&str> = codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["9", "10"]);
    }

    #[tokio::test]
    async fn test_lookup_key() {
        let store = store();
        let key = store
            .lookup_key(ReferenceTable::Genders, &CodeKey::Text("M".into()))
            .await
            .unwrap();
        assert_eq!(key, Some(2));

        let missing = store
            .lookup_key(ReferenceTable::Species, &CodeKey::Text("ZZ".into()))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_insert_checks_foreign_keys() {
        let store = store();
        let mut body = person("Rem", date(2001, 2, 2), 1);
        body.species_fk = 99;

        let err = store.insert_person(&body).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_update_delete() {
        let store = store();
        let created = store
            .insert_person(&person("Rem", date(2001, 2, 2), 1))
            .await
            .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(created.age, 24);

        let renamed = store
            .update_person(created.id, &person("Ram", date(2001, 2, 2), 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Ram");

        assert!(store.delete_person(created.id).await.unwrap());
        assert!(!store.delete_person(created.id).await.unwrap());
        assert!(store.get_person(created.id).await.unwrap().is_none());
        assert!(store
            .update_person(created.id, &person("Ram", date(2001, 2, 2), 1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_count_with_clause() {
        let store = store();
        assert_eq!(store.count_persons(&FilterClause::default()).await.unwrap(), 2);

        let clause = FilterClause::from_keys(&[(Dimension::Gender, 2)]);
        assert_eq!(store.count_persons(&clause).await.unwrap(), 1);
    }
}
