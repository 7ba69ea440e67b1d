//! Entity mapping definitions
//!
//! An entity mapping binds a logical entity to one physical table and each
//! logical field to one physical column. Physical identifiers are written
//! verbatim into SQL, so they are restricted to plain (optionally
//! schema-qualified) identifiers at load time.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Logical field probed first when resolving a time-range column
pub const TIMESTAMP_FIELD: &str = "timestamp";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier pattern is valid")
    })
}

fn order_term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?(\s+(ASC|DESC))?$")
            .expect("order term pattern is valid")
    })
}

/// Returns true if `s` may be written into SQL as a bare identifier
pub fn is_valid_identifier(s: &str) -> bool {
    identifier_pattern().is_match(s)
}

/// Mapping for one logical entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMapping {
    /// Physical table name
    pub table: String,

    /// Logical field name -> physical column name
    pub fields: BTreeMap<String, String>,

    /// Physical ORDER BY used when a list plan has no ordering,
    /// e.g. `order_date DESC`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_order_by: Option<String>,

    /// Whether every plan against this entity must carry a time range
    #[serde(default)]
    pub time_range_required: bool,

    /// Logical date field used for time ranges when there is no `timestamp` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,

    /// Per-entity row-limit ceiling (overrides the global ceiling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<u64>,
}

impl EntityMapping {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: BTreeMap::new(),
            default_order_by: None,
            time_range_required: false,
            date_field: None,
            max_limit: None,
        }
    }

    pub fn with_field(mut self, logical: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields.insert(logical.into(), column.into());
        self
    }

    pub fn with_default_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.default_order_by = Some(order_by.into());
        self
    }

    pub fn with_time_range_required(mut self, required: bool) -> Self {
        self.time_range_required = required;
        self
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = Some(field.into());
        self
    }

    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = Some(limit);
        self
    }

    /// Physical column for a logical field
    pub fn column(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Logical field a time range applies to.
    ///
    /// Probes `timestamp`, then the configured `date_field`, then the
    /// conventional `<entity>Date` (`Order` -> `orderDate`).
    pub fn timestamp_field(&self, entity_name: &str) -> Option<&str> {
        if let Some((name, _)) = self.fields.get_key_value(TIMESTAMP_FIELD) {
            return Some(name.as_str());
        }
        if let Some(field) = self.date_field.as_deref() {
            if let Some((name, _)) = self.fields.get_key_value(field) {
                return Some(name.as_str());
            }
        }
        let conventional = conventional_date_field(entity_name);
        self.fields
            .get_key_value(conventional.as_str())
            .map(|(name, _)| name.as_str())
    }

    /// Checks the mapping can be written into SQL safely.
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_valid_identifier(&self.table) {
            return Err(format!("table '{}' is not a valid identifier", self.table));
        }
        if self.fields.is_empty() {
            return Err("field map must not be empty".into());
        }
        for (logical, column) in &self.fields {
            if logical.is_empty() {
                return Err("logical field names must not be empty".into());
            }
            if !is_valid_identifier(column) {
                return Err(format!(
                    "column '{}' for field '{}' is not a valid identifier",
                    column, logical
                ));
            }
        }
        if let Some(order_by) = &self.default_order_by {
            let valid = order_by
                .split(',')
                .all(|term| order_term_pattern().is_match(term.trim()));
            if !valid {
                return Err(format!("defaultOrderBy '{}' is not a column list", order_by));
            }
        }
        if let Some(field) = &self.date_field {
            if !self.fields.contains_key(field) {
                return Err(format!("dateField '{}' is not a mapped field", field));
            }
        }
        if self.max_limit == Some(0) {
            return Err("maxLimit must be positive".into());
        }
        Ok(())
    }
}

fn conventional_date_field(entity_name: &str) -> String {
    let mut chars = entity_name.chars();
    match chars.next() {
        Some(first) => format!("{}{}Date", first.to_lowercase(), chars.as_str()),
        None => "date".to_string(),
    }
}
