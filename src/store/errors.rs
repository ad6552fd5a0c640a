//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the tabular data store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not reach the database (I/O, TLS, pool closed)
    #[error("store unreachable: {0}")]
    Connection(String),

    /// Pool acquire or statement timed out
    #[error("store operation timed out")]
    Timeout,

    /// A foreign key or unique constraint rejected the write
    #[error("constraint violated: {0}")]
    Conflict(String),

    /// Any other driver-level failure
    #[error("query failed: {0}")]
    Query(String),

    /// The in-memory store lock was poisoned by a panicking writer
    #[error("in-memory store lock poisoned")]
    Poisoned,
}

/// SQLSTATE raised when `statement_timeout` cancels a query
const QUERY_CANCELED: &str = "57014";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::PoolClosed => StoreError::Connection("pool closed".to_string()),
            sqlx::Error::Database(db) => {
                if db.is_foreign_key_violation() || db.is_unique_violation() {
                    StoreError::Conflict(db.message().to_string())
                } else if db.code().as_deref() == Some(QUERY_CANCELED) {
                    StoreError::Timeout
                } else {
                    StoreError::Query(db.message().to_string())
                }
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Timeout
        ));
    }

    #[test]
    fn test_pool_closed_maps_to_connection() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Connection(_)
        ));
    }

    #[test]
    fn test_row_not_found_maps_to_query() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
