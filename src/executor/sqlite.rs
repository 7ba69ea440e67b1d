//! SQLite executor on rusqlite
//!
//! One connection behind a mutex. Timestamps bind as fixed-width RFC 3339
//! text with milliseconds (`2024-01-01T10:00:00.500Z`). SQLite compares text
//! byte by byte, so time columns used in ranges must store exactly that form
//! (`strftime('%Y-%m-%dT%H:%M:%fZ', ...)` produces it). BLOB columns come
//! back as URL-safe base64 strings.

use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde_json::{Number, Value};

use crate::compiler::SqlValue;

use super::errors::{ExecutorError, ExecutorResult};
use super::executor::{Row, StatementExecutor};

const IN_MEMORY: &str = ":memory:";

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            SqlValue::Timestamp(ts) => {
                ToSqlOutput::Owned(SqliteValue::Text(SqlValue::timestamp_text(ts)))
            }
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Opens a database file; `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> ExecutorResult<Self> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY {
            return Self::open_in_memory();
        }
        let conn = Connection::open(path).map_err(|source| ExecutorError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> ExecutorResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| ExecutorError::Open {
            path: IN_MEMORY.to_string(),
            source,
        })?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs a batch of `;`-separated statements with no parameters (schema, seed data).
    pub fn execute_batch(&self, sql: &str) -> ExecutorResult<()> {
        let conn = self.conn.lock().map_err(|_| ExecutorError::ConnectionPoisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl StatementExecutor for SqliteExecutor {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<Vec<Row>> {
        let conn = self.conn.lock().map_err(|_| ExecutorError::ConnectionPoisoned)?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                let value = to_json(column, row.get_ref(idx)?)?;
                record.insert(column.clone(), value);
            }
            out.push(record);
        }
        Ok(out)
    }

    fn execute_scalar(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<u64> {
        let conn = self.conn.lock().map_err(|_| ExecutorError::ConnectionPoisoned)?;
        let count: i64 = conn.query_row(sql, params_from_iter(params.iter()), |row| row.get(0))?;
        u64::try_from(count).map_err(|_| ExecutorError::InvalidScalar(count))
    }
}

fn to_json(column: &str, value: ValueRef<'_>) -> ExecutorResult<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ExecutorError::ConversionFailed {
                column: column.to_string(),
                reason: "non-finite real".into(),
            }),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| ExecutorError::ConversionFailed {
                column: column.to_string(),
                reason: e.to_string(),
            }),
        ValueRef::Blob(bytes) => Ok(Value::String(URL_SAFE_NO_PAD.encode(bytes))),
    }
}
