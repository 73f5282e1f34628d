use domain::RepositoryError;
use thiserror::Error;

/// Errors raised inside the storage backends before they are reported
/// through [`RepositoryError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Writes were disabled on an in-memory store.
    #[error("Store unavailable: {0}")]
    Unavailable(&'static str),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::Database(ref db_err))
                if db_err.is_unique_violation() =>
            {
                RepositoryError::Conflict(db_err.message().to_string())
            }
            StoreError::Database(sqlx::Error::Database(ref db_err))
                if is_contention(db_err.code().as_deref()) =>
            {
                RepositoryError::Conflict(db_err.message().to_string())
            }
            other => RepositoryError::Backend(Box::new(other)),
        }
    }
}

/// SQLSTATE 40001 (serialization failure) and 40P01 (deadlock detected).
fn is_contention(code: Option<&str>) -> bool {
    matches!(code, Some("40001" | "40P01"))
}

/// Result type for store-internal operations.
pub type Result<T> = std::result::Result<T, StoreError>;
