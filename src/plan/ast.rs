//! QueryPlan structures
//!
//! A plan names a logical entity, one of three operations and a flat list
//! of AND-ed filters. Enumerated parts (operation, operator, aggregate
//! function, sort direction) keep unrecognised input in an `Unsupported`
//! variant so the validator can report exactly what the caller sent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    List,
    Aggregate,
    /// List that is expected to carry `like` filters
    Search,
    Unsupported(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Operation::List => "list",
            Operation::Aggregate => "aggregate",
            Operation::Search => "search",
            Operation::Unsupported(s) => s,
        }
    }
}

impl From<String> for Operation {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "list" => Operation::List,
            "aggregate" => Operation::Aggregate,
            "search" => Operation::Search,
            _ => Operation::Unsupported(s),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.as_str().to_string()
    }
}

/// Filter comparison operators
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match, value wrapped in `%...%`
    Like,
    /// Membership in a non-empty list
    In,
    /// Inclusive range, exactly two values
    Between,
    Unsupported(String),
}

impl FilterOperator {
    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::Between => "between",
            FilterOperator::Unsupported(s) => s,
        }
    }
}

impl From<String> for FilterOperator {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "eq" => FilterOperator::Eq,
            "ne" | "neq" => FilterOperator::Ne,
            "gt" => FilterOperator::Gt,
            "gte" => FilterOperator::Gte,
            "lt" => FilterOperator::Lt,
            "lte" => FilterOperator::Lte,
            "like" => FilterOperator::Like,
            "in" => FilterOperator::In,
            "between" => FilterOperator::Between,
            _ => FilterOperator::Unsupported(s),
        }
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.as_str().to_string()
    }
}

/// Aggregate functions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Unsupported(String),
}

impl AggregateFunction {
    pub fn as_str(&self) -> &str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Unsupported(s) => s,
        }
    }
}

impl From<String> for AggregateFunction {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "count" => AggregateFunction::Count,
            "sum" => AggregateFunction::Sum,
            "avg" => AggregateFunction::Avg,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            _ => AggregateFunction::Unsupported(s),
        }
    }
}

impl From<AggregateFunction> for String {
    fn from(f: AggregateFunction) -> Self {
        f.as_str().to_string()
    }
}

/// Sort direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
    Unsupported(String),
}

impl SortDirection {
    pub fn as_str(&self) -> &str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
            SortDirection::Unsupported(s) => s,
        }
    }
}

impl From<String> for SortDirection {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => SortDirection::Unsupported(s),
        }
    }
}

impl From<SortDirection> for String {
    fn from(d: SortDirection) -> Self {
        d.as_str().to_string()
    }
}

/// One `field operator value` predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn like(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Like, value)
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    pub fn between(field: impl Into<String>, low: Value, high: Value) -> Self {
        Self::new(field, FilterOperator::Between, Value::Array(vec![low, high]))
    }
}

/// One aggregate output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggregateFunction,
    /// Logical field, or `*` for `count(*)`
    pub field: String,
    /// Result key, returned with its case preserved
    pub alias: String,
}

impl Aggregation {
    pub fn new(function: AggregateFunction, field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            function,
            field: field.into(),
            alias: alias.into(),
        }
    }

    pub fn count_all(alias: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Count, WILDCARD, alias)
    }

    pub fn is_wildcard(&self) -> bool {
        self.field == WILDCARD
    }
}

/// Literal field accepted by aggregations only
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Inclusive time window. Bounds are ISO-8601 text, parsed at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.as_deref().is_some_and(|s| !s.is_empty())
            && self.end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Logical query submitted by a caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Continuation token; when set every other field is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_token: Option<String>,
}

impl QueryPlan {
    pub fn new(request_id: impl Into<String>, entity: impl Into<String>, operation: Operation) -> Self {
        Self {
            request_id: Some(request_id.into()),
            entity: Some(entity.into()),
            operation: Some(operation),
            ..Default::default()
        }
    }

    /// A plan that only continues a previous result
    pub fn continuation(request_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            query_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn with_group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by.push(field.into());
        self
    }

    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or_default()
    }

    pub fn entity_name(&self) -> &str {
        self.entity.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_deserializes_from_caller_json() {
        let plan: QueryPlan = serde_json::from_value(json!({
            "requestId": "r-1",
            "entity": "Order",
            "operation": "list",
            "filters": [{"field": "status", "operator": "eq", "value": "PAID"}],
            "orderBy": [{"field": "orderDate", "direction": "DESC"}],
            "limit": 10
        }))
        .unwrap();

        assert_eq!(plan.operation, Some(Operation::List));
        assert_eq!(plan.filters[0].operator, FilterOperator::Eq);
        assert_eq!(plan.order_by[0].direction, SortDirection::Desc);
        assert_eq!(plan.limit, Some(10));
        assert!(plan.query_token.is_none());
    }

    #[test]
    fn test_unknown_enumerations_are_preserved() {
        let plan: QueryPlan = serde_json::from_value(json!({
            "requestId": "r-1",
            "entity": "Order",
            "operation": "delete",
            "filters": [{"field": "status", "operator": "regex", "value": ".*"}],
            "aggregations": [{"function": "median", "field": "x", "alias": "m"}]
        }))
        .unwrap();

        assert_eq!(plan.operation, Some(Operation::Unsupported("delete".into())));
        assert_eq!(plan.filters[0].operator, FilterOperator::Unsupported("regex".into()));
        assert_eq!(
            plan.aggregations[0].function,
            AggregateFunction::Unsupported("median".into())
        );
    }

    #[test]
    fn test_sort_direction_defaults_to_asc() {
        let order: OrderBy = serde_json::from_value(json!({"field": "status"})).unwrap();
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let plan = QueryPlan::new("r-1", "Order", Operation::Aggregate)
            .with_aggregation(Aggregation::count_all("order_count"))
            .with_group_by("status");
        let value = serde_json::to_value(&plan).unwrap();

        assert_eq!(value["requestId"], "r-1");
        assert_eq!(value["operation"], "aggregate");
        assert_eq!(value["groupBy"], json!(["status"]));
        assert_eq!(value["aggregations"][0]["function"], "count");
        assert!(value.get("queryToken").is_none());
    }

    #[test]
    fn test_time_range_completeness() {
        assert!(TimeRange::new("2024-01-01", "2024-02-01").is_complete());
        let partial = TimeRange {
            start: Some("2024-01-01".into()),
            end: None,
        };
        assert!(!partial.is_complete());
    }
}
