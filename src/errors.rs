//! Unified error type for the data layer.
//!
//! Storage errors from `SeaORM` are passed through untouched; the remaining
//! variants cover input validation performed before anything is written.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying storage failure (I/O, constraint violation, ...)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// A required field is missing or inconsistent
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
    },

    /// Transaction amounts are stored as non-negative magnitudes
    #[error("Invalid amount: {amount} (amounts must not be negative)")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// A calendar day that is not `YYYY-MM-DD`, or an impossible year/month
    #[error("Invalid date: {value}")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// The addressed row does not exist
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name (`"employer"`, `"worker"`, ...)
        entity: &'static str,
        /// Requested primary key
        id: i64,
    },

    /// Backup document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backup file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
