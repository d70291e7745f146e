use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub mod health;
pub mod token;
pub mod user;

pub use health::PostgresHealthCheck;
pub use token::PostgresTokenRepository;
pub use user::PostgresUserRepository;

/// Failure of one store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store call exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Name of the unique constraint this failure violated, if any.
    pub fn violated_unique_constraint(&self) -> Option<&str> {
        match self {
            StoreError::Database(e) => e
                .as_database_error()
                .filter(|db_err| db_err.is_unique_violation())
                .and_then(|db_err| db_err.constraint()),
            StoreError::DeadlineExceeded(_) => None,
        }
    }
}

/// Run a store call under `deadline`. The call is abandoned, not retried, once the deadline passes.
pub async fn within<T, F>(deadline: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::DeadlineExceeded(deadline)),
    }
}
