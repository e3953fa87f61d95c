//! Store error types.

use purchases_common::PurchasesError;
use thiserror::Error;

/// Errors raised by a transaction store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write.
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// The store did not answer in time.
    #[error("Store timed out: {0}")]
    Timeout(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout("connection pool exhausted".into()),
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for PurchasesError {
    fn from(err: StoreError) -> Self {
        PurchasesError::Persistence(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_timeout() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Timeout(_)
        ));
    }

    #[test]
    fn test_closed_pool_is_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_store_errors_are_persistence_errors() {
        let err: PurchasesError = StoreError::Rejected("check violation".into()).into();
        assert_eq!(err, PurchasesError::Persistence("Write rejected: check violation".into()));
    }
}
