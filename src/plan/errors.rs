//! Caller-facing query error taxonomy
//!
//! Error codes:
//! - VALIDATION_ERROR (client)
//! - INVALID_ENTITY (client)
//! - INVALID_OPERATION (client)
//! - INVALID_FIELD (client)
//! - INVALID_OPERATOR (client)
//! - INVALID_TOKEN (client)
//! - EXECUTION_ERROR (server)
//!
//! None of these are retried internally and none carry raw driver text.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryErrorCode {
    /// Malformed plan: missing required field or time range
    ValidationError,
    /// Entity is not in the mapping registry
    InvalidEntity,
    /// Operation is not list, aggregate or search
    InvalidOperation,
    /// Field is not mapped for the entity
    InvalidField,
    /// Operator is not supported
    InvalidOperator,
    /// Pagination token unknown, consumed or expired
    InvalidToken,
    /// The relational store rejected or failed the statement
    ExecutionError,
}

impl QueryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::ValidationError => "VALIDATION_ERROR",
            QueryErrorCode::InvalidEntity => "INVALID_ENTITY",
            QueryErrorCode::InvalidOperation => "INVALID_OPERATION",
            QueryErrorCode::InvalidField => "INVALID_FIELD",
            QueryErrorCode::InvalidOperator => "INVALID_OPERATOR",
            QueryErrorCode::InvalidToken => "INVALID_TOKEN",
            QueryErrorCode::ExecutionError => "EXECUTION_ERROR",
        }
    }

    /// Client errors are deterministic rejections; the request should not be retried unchanged.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryErrorCode::ExecutionError)
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error with the offending field, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    /// Error class of an execution failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl QueryError {
    fn new(code: QueryErrorCode, message: impl Into<String>, field: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field,
            detail: None,
        }
    }

    /// Malformed plan, naming the field at fault
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(QueryErrorCode::ValidationError, reason, Some(field.into()))
    }

    /// A required plan field is absent
    pub fn missing(field: impl Into<String>) -> Self {
        let f = field.into();
        Self::new(
            QueryErrorCode::ValidationError,
            format!("'{}' is required", f),
            Some(f),
        )
    }

    pub fn invalid_entity(entity: impl Into<String>) -> Self {
        let e = entity.into();
        Self::new(
            QueryErrorCode::InvalidEntity,
            format!("Entity '{}' is not queryable", e),
            Some("entity".into()),
        )
    }

    pub fn invalid_operation(operation: impl Into<String>) -> Self {
        Self::new(
            QueryErrorCode::InvalidOperation,
            format!(
                "Operation '{}' is not supported (expected list, aggregate or search)",
                operation.into()
            ),
            Some("operation".into()),
        )
    }

    pub fn invalid_field(entity: &str, field: impl Into<String>) -> Self {
        let f = field.into();
        Self::new(
            QueryErrorCode::InvalidField,
            format!("Field '{}' is not defined for entity '{}'", f, entity),
            Some(f),
        )
    }

    pub fn invalid_operator(field: impl Into<String>, operator: &str) -> Self {
        Self::new(
            QueryErrorCode::InvalidOperator,
            format!("Operator '{}' is not supported", operator),
            Some(field.into()),
        )
    }

    pub fn invalid_token() -> Self {
        Self::new(
            QueryErrorCode::InvalidToken,
            "Query token is invalid, already used or expired",
            Some("queryToken".into()),
        )
    }

    /// Execution failure; `kind` is the error class, never the driver message
    pub fn execution(kind: impl Into<String>) -> Self {
        let mut err = Self::new(QueryErrorCode::ExecutionError, "Query execution failed", None);
        err.detail = Some(kind.into());
        err
    }

    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " [field {}]", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

/// Result type for plan validation
pub type PlanResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QueryErrorCode::ValidationError.code(), "VALIDATION_ERROR");
        assert_eq!(QueryErrorCode::InvalidEntity.code(), "INVALID_ENTITY");
        assert_eq!(QueryErrorCode::InvalidOperation.code(), "INVALID_OPERATION");
        assert_eq!(QueryErrorCode::InvalidField.code(), "INVALID_FIELD");
        assert_eq!(QueryErrorCode::InvalidOperator.code(), "INVALID_OPERATOR");
        assert_eq!(QueryErrorCode::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(QueryErrorCode::ExecutionError.code(), "EXECUTION_ERROR");
    }

    #[test]
    fn test_serialized_code_matches_code_string() {
        for code in [
            QueryErrorCode::ValidationError,
            QueryErrorCode::InvalidOperator,
            QueryErrorCode::ExecutionError,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.code());
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(QueryErrorCode::InvalidField.is_client_error());
        assert!(QueryErrorCode::InvalidToken.is_client_error());
        assert!(!QueryErrorCode::ExecutionError.is_client_error());
    }

    #[test]
    fn test_invalid_field_reports_field() {
        let err = QueryError::invalid_field("Order", "secret");
        assert_eq!(err.field(), Some("secret"));
        assert!(err.to_string().contains("INVALID_FIELD"));
    }

    #[test]
    fn test_execution_error_carries_only_class() {
        let err = QueryError::execution("SqliteFailure");
        assert_eq!(err.detail(), Some("SqliteFailure"));
        assert_eq!(err.message(), "Query execution failed");
        assert_eq!(err.field(), None);
    }
}
