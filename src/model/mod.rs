//! Domain records exchanged with the store and rendered over HTTP.

mod person;
mod reference;

pub use person::{age_in_years, InvalidPerson, NewPerson, Person};
pub use reference::{CodeInfo, CodeKey, Dimension, ReferenceRow, ReferenceTable};
