//! # Statistics Errors

use thiserror::Error;

use crate::model::Dimension;
use crate::store::StoreError;

/// Result type for filter resolution and aggregation
pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug, Clone, Error)]
pub enum StatsError {
    /// A supplied filter code has no reference row (or a strata code is
    /// not an integer)
    #[error("unknown {dimension} code '{code}'")]
    UnknownCode { dimension: Dimension, code: String },

    /// The fully resolved query matched no persons
    #[error("no persons match the requested filters")]
    Empty,

    #[error(transparent)]
    Store(#[from] StoreError),
}
