//! # Filter Clause Builder
//!
//! Turns the optional `speciesCode` / `strataCode` / `genderCode` query
//! parameters into a conjunctive clause over the `persons` foreign keys.
//!
//! The clause is a list of (predicate template, parameter) pairs. Column
//! names come from [`Dimension`]; resolved keys are only ever bound as
//! positional parameters.

use serde::{Deserialize, Deserializer};

use super::errors::StatsResult;
use super::resolver::resolve;
use crate::model::{Dimension, NewPerson};
use crate::store::PopulationStore;

/// Optional filter codes of a statistics request.
///
/// Empty values (`?genderCode=`) are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterRequest {
    #[serde(rename = "speciesCode", default, deserialize_with = "empty_as_none")]
    pub species_code: Option<String>,

    #[serde(rename = "strataCode", default, deserialize_with = "empty_as_none")]
    pub strata_code: Option<String>,

    #[serde(rename = "genderCode", default, deserialize_with = "empty_as_none")]
    pub gender_code: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

impl FilterRequest {
    /// No filters: the whole population
    pub fn all() -> Self {
        Self::default()
    }

    pub fn species(mut self, code: impl Into<String>) -> Self {
        self.species_code = Some(code.into());
        self
    }

    pub fn strata(mut self, code: impl Into<String>) -> Self {
        self.strata_code = Some(code.into());
        self
    }

    pub fn gender(mut self, code: impl Into<String>) -> Self {
        self.gender_code = Some(code.into());
        self
    }

    /// Code supplied for `dimension`, if any
    pub fn code(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Species => self.species_code.as_deref(),
            Dimension::Strata => self.strata_code.as_deref(),
            Dimension::Gender => self.gender_code.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ORDER.iter().all(|d| self.code(*d).is_none())
    }
}

/// One resolved equality predicate: `<dimension>_fk = key`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub dimension: Dimension,
    pub key: i32,
}

/// Resolved conjunction of predicates, in binding order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterClause {
    predicates: Vec<Predicate>,
}

impl FilterClause {
    /// Build from already resolved keys, kept in the given order
    pub fn from_keys(keys: &[(Dimension, i32)]) -> Self {
        Self {
            predicates: keys
                .iter()
                .map(|&(dimension, key)| Predicate { dimension, key })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// ` WHERE a_fk = $1 AND b_fk = $2`, or an empty string when there
    /// are no predicates
    pub fn where_sql(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let conditions: Vec<String> = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} = ${}", p.dimension.fk_column(), i + 1))
            .collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }

    /// Parameter values, slot `$n` at index `n - 1`
    pub fn params(&self) -> impl Iterator<Item = i32> + '_ {
        self.predicates.iter().map(|p| p.key)
    }

    /// Evaluate the clause against a person held in memory
    pub fn matches(&self, person: &NewPerson) -> bool {
        self.predicates
            .iter()
            .all(|p| person.foreign_key(p.dimension) == p.key)
    }
}

/// Resolve every supplied code, species then strata then gender, and
/// collect the predicates. The first unresolvable code aborts the build.
pub async fn build(store: &dyn PopulationStore, filters: &FilterRequest) -> StatsResult<FilterClause> {
    let mut predicates = Vec::with_capacity(Dimension::ORDER.len());
    for dimension in Dimension::ORDER {
        if let Some(code) = filters.code(dimension) {
            let key = resolve(store, dimension, code).await?;
            predicates.push(Predicate { dimension, key });
        }
    }
    Ok(FilterClause { predicates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceTable;
    use crate::stats::StatsError;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_reference(ReferenceTable::Species, 4, "HU", "Humano")
            .with_reference(ReferenceTable::Strata, 7, "0", "Plebe")
            .with_reference(ReferenceTable::Genders, 2, "F", "Femenino")
    }

    #[tokio::test]
    async fn test_no_filters_builds_empty_clause() {
        let clause = build(&store(), &FilterRequest::all()).await.unwrap();
        assert!(clause.is_empty());
        assert_eq!(clause.where_sql(), "");
        assert_eq!(clause.params().count(), 0);
    }

    #[tokio::test]
    async fn test_fixed_order_regardless_of_request() {
        let filters = FilterRequest::all().gender("F").species("HU").strata("0");
        let clause = build(&store(), &filters).await.unwrap();

        assert_eq!(
            clause.where_sql(),
            " WHERE species_fk = $1 AND strata_fk = $2 AND gender_fk = $3"
        );
        assert_eq!(clause.params().collect::<Vec<_>>(), vec![4, 7, 2]);
    }

    #[tokio::test]
    async fn test_slots_are_dense_for_partial_filters() {
        let filters = FilterRequest::all().gender("F").species("HU");
        let clause = build(&store(), &filters).await.unwrap();

        assert_eq!(clause.where_sql(), " WHERE species_fk = $1 AND gender_fk = $2");
        assert_eq!(clause.params().collect::<Vec<_>>(), vec![4, 2]);
    }

    #[tokio::test]
    async fn test_first_unknown_code_short_circuits() {
        let filters = FilterRequest::all().species("ZZ").gender("X");
        let err = build(&store(), &filters).await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::UnknownCode {
                dimension: Dimension::Species,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_bad_strata_fails_build() {
        let filters = FilterRequest::all().species("HU").strata("high");
        let err = build(&store(), &filters).await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::UnknownCode {
                dimension: Dimension::Strata,
                ..
            }
        ));
    }

    #[test]
    fn test_caller_values_never_reach_sql_text() {
        let clause = FilterClause::from_keys(&[(Dimension::Gender, 12345)]);
        assert!(!clause.where_sql().contains("12345"));
    }

    #[test]
    fn test_empty_query_values_are_absent() {
        let filters: FilterRequest =
            serde_json::from_value(serde_json::json!({"genderCode": "", "speciesCode": "HU"}))
                .unwrap();
        assert_eq!(filters.gender_code, None);
        assert_eq!(filters.species_code.as_deref(), Some("HU"));
        assert!(!filters.is_empty());
        assert!(FilterRequest::default().is_empty());
    }

    #[test]
    fn test_matches_in_memory() {
        let person = NewPerson {
            name: "Aqua".to_string(),
            birthdate: chrono::NaiveDate::from_ymd_opt(1999, 9, 9).unwrap(),
            gender_fk: 2,
            species_fk: 4,
            strata_fk: 7,
        };
        assert!(FilterClause::default().matches(&person));
        assert!(FilterClause::from_keys(&[(Dimension::Species, 4), (Dimension::Gender, 2)])
            .matches(&person));
        assert!(!FilterClause::from_keys(&[(Dimension::Strata, 8)]).matches(&person));
    }
}
