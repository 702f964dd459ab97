//! Error types for the house record repository.

use thiserror::Error;

/// Represents errors that can occur while reading house records.
#[derive(Debug, Error)]
pub enum RecordRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}
