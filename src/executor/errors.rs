//! Executor error types
//!
//! Display text can carry driver detail (table names, syntax fragments) and
//! is only ever logged. Callers see [`ExecutorError::kind`].

use thiserror::Error;

pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Statement failed: {0}")]
    Statement(#[from] rusqlite::Error),

    #[error("Connection lock poisoned")]
    ConnectionPoisoned,

    #[error("Column '{column}' cannot be converted: {reason}")]
    ConversionFailed { column: String, reason: String },

    #[error("Scalar statement returned an invalid count: {0}")]
    InvalidScalar(i64),
}

impl ExecutorError {
    /// Error class name, safe to return to callers
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::Open { .. } => "ConnectionFailed",
            ExecutorError::Statement(err) => match err {
                rusqlite::Error::SqliteFailure(..) => "SqliteFailure",
                rusqlite::Error::InvalidParameterCount(..) => "InvalidParameterCount",
                rusqlite::Error::InvalidColumnType(..) => "InvalidColumnType",
                rusqlite::Error::QueryReturnedNoRows => "QueryReturnedNoRows",
                _ => "SqliteError",
            },
            ExecutorError::ConnectionPoisoned => "ConnectionPoisoned",
            ExecutorError::ConversionFailed { .. } => "ConversionFailed",
            ExecutorError::InvalidScalar(_) => "InvalidScalar",
        }
    }
}
