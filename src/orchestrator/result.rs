//! QueryResult envelope

use serde::{Deserialize, Serialize};

use crate::executor::Row;
use crate::plan::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

/// Result rows, keyed by operation kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryData {
    Rows { rows: Vec<Row> },
    Aggregations { aggregations: Vec<Row> },
}

impl QueryData {
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryData::Rows { rows } => rows,
            QueryData::Aggregations { aggregations } => aggregations,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub execution_time_ms: u64,
    pub rows_returned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// Present only while more pages remain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_token: Option<String>,
    pub has_more: bool,
    pub current_page: u64,
    pub current_offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

/// Response to one QueryPlan; either fully successful or one error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub request_id: Option<String>,
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

impl QueryResult {
    pub fn success(
        request_id: Option<String>,
        data: QueryData,
        metadata: ResultMetadata,
        pagination: PaginationInfo,
    ) -> Self {
        Self {
            request_id,
            status: QueryStatus::Success,
            data: Some(data),
            metadata: Some(metadata),
            pagination: Some(pagination),
            error: None,
        }
    }

    pub fn failure(request_id: Option<String>, error: QueryError) -> Self {
        Self {
            request_id,
            status: QueryStatus::Error,
            data: None,
            metadata: None,
            pagination: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Result rows; empty on error
    pub fn rows(&self) -> &[Row] {
        self.data.as_ref().map(QueryData::rows).unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn query_token(&self) -> Option<&str> {
        self.pagination.as_ref()?.query_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let result = QueryResult::success(
            Some("r1".into()),
            QueryData::Aggregations {
                aggregations: vec![row(json!({"status": "PAID", "order_count": 3}))],
            },
            ResultMetadata {
                execution_time_ms: 4,
                rows_returned: 1,
                total_rows: Some(1),
            },
            PaginationInfo {
                query_token: None,
                has_more: false,
                current_page: 1,
                current_offset: 0,
                total_pages: Some(1),
                total_rows: Some(1),
                page_size: Some(100),
            },
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["requestId"], "r1");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["aggregations"][0]["order_count"], 3);
        assert_eq!(value["metadata"]["rowsReturned"], 1);
        assert_eq!(value["pagination"]["hasMore"], false);
        assert!(value["pagination"].get("queryToken").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let result = QueryResult::failure(Some("r2".into()), QueryError::invalid_token());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], "INVALID_TOKEN");
        assert_eq!(value["error"]["field"], "queryToken");
        assert!(value.get("data").is_none());
        assert!(result.rows().is_empty());
    }

    #[test]
    fn test_envelope_round_trips_rows_variant() {
        let json = json!({
            "requestId": "r3",
            "status": "success",
            "data": {"rows": [{"id": 1}]},
            "metadata": {"executionTimeMs": 1, "rowsReturned": 1},
            "pagination": {"hasMore": false, "currentPage": 1, "currentOffset": 0}
        });
        let result: QueryResult = serde_json::from_value(json).unwrap();
        assert!(matches!(result.data, Some(QueryData::Rows { .. })));
        assert_eq!(result.rows().len(), 1);
    }
}
