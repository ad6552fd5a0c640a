//! Code resolution: human-facing code to internal key.

use super::errors::{StatsError, StatsResult};
use crate::model::{CodeKey, Dimension};
use crate::store::PopulationStore;

/// Resolve `code` to the id of the matching row in the reference table of
/// `dimension`.
///
/// A strata code that is not an integer fails exactly like a code with no
/// row, and never reaches the store. Store failures propagate unchanged.
pub async fn resolve(
    store: &dyn PopulationStore,
    dimension: Dimension,
    code: &str,
) -> StatsResult<i32> {
    let table = dimension.reference_table();
    let unknown = || StatsError::UnknownCode {
        dimension,
        code: code.to_string(),
    };

    let key = CodeKey::parse(table, code).ok_or_else(unknown)?;
    store.lookup_key(table, &key).await?.ok_or_else(unknown)
}
