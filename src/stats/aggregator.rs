//! # Statistics Aggregator
//!
//! Count-with-percentage and age distribution over the filtered person
//! population. Both read fresh from the store on every call.

use serde::{Deserialize, Serialize};

use super::errors::{StatsError, StatsResult};
use super::filter::{build, FilterRequest};
use crate::store::PopulationStore;

/// Multiplier applied to `filtered / total`. `1.0` reports a ratio in
/// `[0, 1]`; `100.0` would report a percentage in `[0, 100]`.
pub const PERCENTAGE_SCALE: f64 = 1.0;

/// Decimal places kept in `CountStat::percentage`
pub const PERCENTAGE_DECIMALS: i32 = 6;

/// Decimal places kept in every `AgeStat` field
pub const AGE_DECIMALS: i32 = 4;

/// Response of `/v1/stats/count`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountStat {
    pub count: i64,
    pub percentage: f64,
}

/// Response of `/v1/stats/age`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeStat {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Count persons matching `filters` and their share of the whole
/// population.
///
/// The total is taken first and without filters, so an empty population
/// is [`StatsError::Empty`] even when a filter code would not resolve.
pub async fn count_stats(
    store: &dyn PopulationStore,
    filters: &FilterRequest,
) -> StatsResult<CountStat> {
    let total = store.count_persons(&Default::default()).await?;
    if total == 0 {
        return Err(StatsError::Empty);
    }

    let clause = build(store, filters).await?;
    let count = if clause.is_empty() {
        total
    } else {
        store.count_persons(&clause).await?
    };
    if count == 0 {
        return Err(StatsError::Empty);
    }

    let percentage = round_to(count as f64 / total as f64 * PERCENTAGE_SCALE, PERCENTAGE_DECIMALS);
    Ok(CountStat { count, percentage })
}

/// Min, max, mean and sample standard deviation of derived age over the
/// persons matching `filters`. A single matching person has `stddev` 0.
pub async fn age_stats(
    store: &dyn PopulationStore,
    filters: &FilterRequest,
) -> StatsResult<AgeStat> {
    let clause = build(store, filters).await?;
    let summary = store.age_summary(&clause).await?;

    let (Some(min), Some(max), Some(mean)) = (summary.min, summary.max, summary.mean) else {
        return Err(StatsError::Empty);
    };

    Ok(AgeStat {
        min: round_to(min, AGE_DECIMALS),
        max: round_to(max, AGE_DECIMALS),
        mean: round_to(mean, AGE_DECIMALS),
        stddev: round_to(summary.stddev.unwrap_or(0.0), AGE_DECIMALS),
    })
}
