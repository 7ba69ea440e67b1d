//! # Compiler Errors
//!
//! A validated plan only fails compilation on a bad time bound. The other
//! variants are reached when `compile` is called on an unvalidated plan;
//! each maps onto the caller-facing code the validator would have used.

use thiserror::Error;

use crate::plan::QueryError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Plan is missing '{0}'")]
    Missing(&'static str),

    #[error("Entity '{0}' is not mapped")]
    UnknownEntity(String),

    #[error("Field '{field}' is not mapped for entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("Operation '{0}' cannot be compiled")]
    UnsupportedOperation(String),

    #[error("Operator '{operator}' on field '{field}' cannot be compiled")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unparseable time bound '{value}' for timeRange.{bound}")]
    InvalidTimeBound { bound: &'static str, value: String },

    #[error("Entity '{0}' has no time field for timeRange")]
    NoTimeField(String),
}

impl From<CompileError> for QueryError {
    fn from(err: CompileError) -> Self {
        let message = err.to_string();
        match err {
            CompileError::Missing(field) => QueryError::missing(field),
            CompileError::UnknownEntity(entity) => QueryError::invalid_entity(entity),
            CompileError::UnknownField { entity, field } => QueryError::invalid_field(&entity, field),
            CompileError::UnsupportedOperation(op) => QueryError::invalid_operation(op),
            CompileError::UnsupportedOperator { field, operator } => {
                QueryError::invalid_operator(field, &operator)
            }
            CompileError::InvalidValue { field, .. } => QueryError::validation(field, message),
            CompileError::InvalidTimeBound { .. } | CompileError::NoTimeField(_) => {
                QueryError::validation("timeRange", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::QueryErrorCode;

    #[test]
    fn test_time_bound_maps_to_validation_error() {
        let err: QueryError = CompileError::InvalidTimeBound {
            bound: "start",
            value: "soon".into(),
        }
        .into();
        assert_eq!(err.code(), QueryErrorCode::ValidationError);
        assert_eq!(err.field(), Some("timeRange"));
        assert!(err.message().contains("soon"));
    }

    #[test]
    fn test_whitelist_errors_keep_their_codes() {
        let err: QueryError = CompileError::UnknownField {
            entity: "Order".into(),
            field: "ssn".into(),
        }
        .into();
        assert_eq!(err.code(), QueryErrorCode::InvalidField);
        assert_eq!(err.field(), Some("ssn"));

        let err: QueryError = CompileError::UnknownEntity("Invoice".into()).into();
        assert_eq!(err.code(), QueryErrorCode::InvalidEntity);
    }
}
