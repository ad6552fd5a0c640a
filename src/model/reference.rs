//! Reference tables: genders, species and strata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three reference tables. Table and column names used in SQL come
/// only from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceTable {
    Genders,
    Species,
    Strata,
}

impl ReferenceTable {
    /// All reference tables, in declaration order
    pub const ALL: [ReferenceTable; 3] = [
        ReferenceTable::Genders,
        ReferenceTable::Species,
        ReferenceTable::Strata,
    ];

    /// SQL table name
    pub fn table_name(&self) -> &'static str {
        match self {
            ReferenceTable::Genders => "genders",
            ReferenceTable::Species => "species",
            ReferenceTable::Strata => "strata",
        }
    }

    /// Strata are keyed by an integer code, the others by text
    pub fn has_numeric_code(&self) -> bool {
        matches!(self, ReferenceTable::Strata)
    }

    /// Human readable singular, used in problem details
    pub fn entity_name(&self) -> &'static str {
        match self {
            ReferenceTable::Genders => "gender",
            ReferenceTable::Species => "species",
            ReferenceTable::Strata => "stratum",
        }
    }
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A full reference row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferenceRow {
    pub id: i32,
    pub code: String,
    pub name: String,
}

impl ReferenceRow {
    pub fn new(id: i32, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
        }
    }

    /// Project to the `{code, name}` listing shape
    pub fn code_info(&self) -> CodeInfo {
        CodeInfo {
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }
}

/// `{code, name}` entry returned by `/v1/info/*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CodeInfo {
    pub code: String,
    pub name: String,
}

/// A code value ready to be bound in a point lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKey {
    Text(String),
    Number(i32),
}

impl CodeKey {
    /// Interpret a caller-supplied code for `table`. Numeric tables reject
    /// anything that is not an `i32` literal.
    pub fn parse(table: ReferenceTable, code: &str) -> Option<Self> {
        if table.has_numeric_code() {
            code.parse::<i32>().ok().map(CodeKey::Number)
        } else {
            Some(CodeKey::Text(code.to_string()))
        }
    }

    /// Does a stored (textual) code equal this key?
    pub fn matches(&self, stored: &str) -> bool {
        match self {
            CodeKey::Text(code) => code == stored,
            CodeKey::Number(n) => stored.parse::<i32>().map_or(false, |s| s == *n),
        }
    }
}

/// A filterable dimension of the person population.
///
/// The variant order is the order in which filters are bound as
/// positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Species,
    Strata,
    Gender,
}

impl Dimension {
    /// Fixed resolution and binding order
    pub const ORDER: [Dimension; 3] = [Dimension::Species, Dimension::Strata, Dimension::Gender];

    /// Reference table holding the codes of this dimension
    pub fn reference_table(&self) -> ReferenceTable {
        match self {
            Dimension::Species => ReferenceTable::Species,
            Dimension::Strata => ReferenceTable::Strata,
            Dimension::Gender => ReferenceTable::Genders,
        }
    }

    /// Foreign key column on `persons`
    pub fn fk_column(&self) -> &'static str {
        match self {
            Dimension::Species => "species_fk",
            Dimension::Strata => "strata_fk",
            Dimension::Gender => "gender_fk",
        }
    }

    /// Query string parameter carrying the code
    pub fn query_param(&self) -> &'static str {
        match self {
            Dimension::Species => "speciesCode",
            Dimension::Strata => "strataCode",
            Dimension::Gender => "genderCode",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Species => "species",
            Dimension::Strata => "strata",
            Dimension::Gender => "gender",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_order_is_species_strata_gender() {
        assert_eq!(
            Dimension::ORDER,
            [Dimension::Species, Dimension::Strata, Dimension::Gender]
        );
        let mut sorted = Dimension::ORDER;
        sorted.sort();
        assert_eq!(sorted, Dimension::ORDER);
    }

    #[test]
    fn test_dimension_columns() {
        assert_eq!(Dimension::Gender.fk_column(), "gender_fk");
        assert_eq!(Dimension::Gender.reference_table(), ReferenceTable::Genders);
        assert_eq!(Dimension::Strata.query_param(), "strataCode");
    }

    #[test]
    fn test_only_strata_is_numeric() {
        assert!(ReferenceTable::Strata.has_numeric_code());
        assert!(!ReferenceTable::Species.has_numeric_code());
        assert!(!ReferenceTable::Genders.has_numeric_code());
    }

    #[test]
    fn test_code_key_parse() {
        assert_eq!(
            CodeKey::parse(ReferenceTable::Strata, "5"),
            Some(CodeKey::Number(5))
        );
        assert_eq!(CodeKey::parse(ReferenceTable::Strata, "five"), None);
        assert_eq!(CodeKey::parse(ReferenceTable::Strata, " 5"), None);
        assert_eq!(
            CodeKey::parse(ReferenceTable::Species, "HU"),
            Some(CodeKey::Text("HU".to_string()))
        );
    }

    #[test]
    fn test_code_key_matches_numeric_forms() {
        assert!(CodeKey::Number(5).matches("5"));
        assert!(CodeKey::Number(5).matches("05"));
        assert!(!CodeKey::Text("05".to_string()).matches("5"));
    }

    #[test]
    fn test_code_info_serialization() {
        let row = ReferenceRow::new(2, "F", "Femenino");
        let json = serde_json::to_value(row.code_info()).unwrap();
        assert_eq!(json, serde_json::json!({"code": "F", "name": "Femenino"}));
    }
}
