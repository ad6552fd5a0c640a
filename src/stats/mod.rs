//! # Population Statistics
//!
//! Code resolution, filter clause construction and the two aggregates
//! served under `/v1/stats`.
//!
//! A request flows resolver -> filter -> aggregator -> store. Nothing is
//! cached between requests.

mod aggregator;
mod errors;
mod filter;
mod resolver;

pub use aggregator::{
    age_stats, count_stats, round_to, AgeStat, CountStat, AGE_DECIMALS, PERCENTAGE_DECIMALS,
    PERCENTAGE_SCALE,
};
pub use errors::{StatsError, StatsResult};
pub use filter::{build, FilterClause, FilterRequest, Predicate};
pub use resolver::resolve;
