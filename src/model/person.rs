//! Person records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Dimension;

/// A stored person. `age` is derived from `birthdate` when the row is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub birthdate: NaiveDate,
    pub age: i32,
    pub gender_fk: i32,
    pub species_fk: i32,
    pub strata_fk: i32,
}

/// Body of `POST /v1/persons` and `PUT /v1/persons/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub birthdate: NaiveDate,
    pub gender_fk: i32,
    pub species_fk: i32,
    pub strata_fk: i32,
}

/// Reasons a person body is rejected before reaching the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPerson {
    #[error("name must not be blank")]
    BlankName,

    #[error("birthdate {0} is in the future")]
    FutureBirthdate(NaiveDate),
}

impl NewPerson {
    /// Check the body against the evaluation date
    pub fn validate(&self, today: NaiveDate) -> Result<(), InvalidPerson> {
        if self.name.trim().is_empty() {
            return Err(InvalidPerson::BlankName);
        }
        if self.birthdate > today {
            return Err(InvalidPerson::FutureBirthdate(self.birthdate));
        }
        Ok(())
    }

    /// Foreign key held for a filter dimension
    pub fn foreign_key(&self, dimension: Dimension) -> i32 {
        match dimension {
            Dimension::Species => self.species_fk,
            Dimension::Strata => self.strata_fk,
            Dimension::Gender => self.gender_fk,
        }
    }

    /// Materialize as a stored person with the given id
    pub fn into_person(self, id: i32, today: NaiveDate) -> Person {
        Person {
            id,
            age: age_in_years(self.birthdate, today),
            name: self.name,
            birthdate: self.birthdate,
            gender_fk: self.gender_fk,
            species_fk: self.species_fk,
            strata_fk: self.strata_fk,
        }
    }
}

/// Whole years elapsed between `birthdate` and `today`.
///
/// Matches PostgreSQL `date_part('year', age(today, birthdate))`: the year
/// only counts once the anniversary has been reached. A Feb 29 birthdate
/// has its anniversary on Mar 1 in non-leap years.
pub fn age_in_years(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    years
}
