//! The relational-store seam

use serde_json::{Map, Value};

use crate::compiler::{CompiledStatement, SqlValue};

use super::errors::ExecutorResult;

/// One result row keyed by column name or alias
pub type Row = Map<String, Value>;

/// Runs compiled statements against a relational store.
///
/// Calls block until the round-trip completes. Implementations must not
/// retry; a failure is reported once.
pub trait StatementExecutor: Send + Sync {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<Vec<Row>>;

    /// Runs a single-value statement such as `SELECT COUNT(*) ...`
    fn execute_scalar(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<u64>;

    fn execute_statement(&self, statement: &CompiledStatement) -> ExecutorResult<Vec<Row>> {
        self.execute(&statement.sql, &statement.params)
    }

    fn execute_count(&self, statement: &CompiledStatement) -> ExecutorResult<u64> {
        self.execute_scalar(&statement.sql, &statement.params)
    }
}
