//! # Pagination Errors

use thiserror::Error;

use crate::compiler::CompileError;

pub type PaginationResult<T> = Result<T, PaginationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// The context map lock was poisoned
    #[error("Pagination store unavailable: {0}")]
    StorageError(String),

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    /// The next-page statement could not be built
    #[error("Cannot compile next page: {0}")]
    Compile(#[from] CompileError),
}

impl PaginationError {
    pub(crate) fn poisoned() -> Self {
        PaginationError::StorageError("Lock poisoned".to_string())
    }

    /// Stable class name, safe to expose
    pub fn kind(&self) -> &'static str {
        match self {
            PaginationError::StorageError(_) => "PaginationStorageError",
            PaginationError::InvalidPageSize => "InvalidPageSize",
            PaginationError::Compile(_) => "PaginationCompileError",
        }
    }
}
