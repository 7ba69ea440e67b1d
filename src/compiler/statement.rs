//! Compiled statements and their positional parameters

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A positional parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl SqlValue {
    /// Converts a scalar JSON filter value.
    ///
    /// Lists and objects never reach here after validation; they are bound
    /// as their JSON text if they do, so the value is still a parameter.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }
    }

    pub fn count(n: u64) -> Self {
        SqlValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Fixed-width RFC 3339 text used when a store binds timestamps as text:
    /// always three fractional digits and a `Z` suffix
    /// (`2024-01-01T10:00:00.500Z`). Text columns compared against it must
    /// hold the same form for ordering to match time order.
    pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

/// SQL text plus its ordered parameter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Parameters rendered as a JSON array for logs
    pub fn params_json(&self) -> String {
        serde_json::to_string(&self.params).unwrap_or_else(|_| "[]".to_string())
    }

    /// Number of `?` placeholders in the SQL text
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(SqlValue::from_json(&json!("PAID")), SqlValue::Text("PAID".into()));
        assert_eq!(SqlValue::from_json(&json!(100)), SqlValue::Integer(100));
        assert_eq!(SqlValue::from_json(&json!(9.5)), SqlValue::Real(9.5));
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&json!(null)), SqlValue::Null);
    }

    #[test]
    fn test_params_serialize_plainly() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let stmt = CompiledStatement::new(
            "SELECT * FROM orders WHERE status = ? AND order_date >= ? LIMIT ?",
            vec![SqlValue::from("PAID"), SqlValue::Timestamp(ts), SqlValue::count(10)],
        );
        let rendered: Value = serde_json::from_str(&stmt.params_json()).unwrap();
        assert_eq!(rendered, json!(["PAID", "2024-01-01T00:00:00Z", 10]));
        assert_eq!(stmt.placeholder_count(), 3);
    }

    #[test]
    fn test_timestamp_text() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        assert_eq!(SqlValue::timestamp_text(&ts), "2024-03-05T12:30:00.000Z");
    }

    #[test]
    fn test_timestamp_text_keeps_milliseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        assert_eq!(SqlValue::timestamp_text(&ts), "2024-01-01T10:00:00.500Z");
    }
}
