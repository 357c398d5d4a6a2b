//! Crate-level error type for `vodkeep-store`.

use thiserror::Error;

/// Errors raised by [`crate::JobStore`](crate::JobStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite connection or query failed.
    #[error("store query failed: {0}")]
    Database(#[from] sqlx::Error),
    /// A migration failed to apply during pool construction.
    #[error("store migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// A row referenced by id does not exist.
    #[error("job not found: {id}")]
    NotFound {
        /// The job id that was looked up.
        id: String,
    },
    /// A conditional transition's predicate was not met.
    #[error("job {id} is not in a state that permits this transition")]
    InvalidState {
        /// The job id the transition targeted.
        id: String,
    },
}
