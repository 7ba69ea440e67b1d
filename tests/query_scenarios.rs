//! Query Scenario Tests
//!
//! End-to-end runs of caller plans against a seeded SQLite store:
//! - Filtered listing, aggregation, range filters and search
//! - Deep pagination through query tokens
//! - Rejected plans never reach the database
//! - Hostile values are bound, never spliced into SQL

mod common;

use common::{Fixture, NOTE_COUNT, ORDER_COUNT};
use querygate::orchestrator::QueryStatus;
use querygate::plan::QueryErrorCode;
use serde_json::{json, Value};

fn ids(rows: &[querygate::executor::Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.get("id").and_then(Value::as_i64).unwrap())
        .collect()
}

// =============================================================================
// Listing and Filtering
// =============================================================================

/// Equality filter returns only matching rows, newest first
#[test]
fn test_filtered_listing() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "scenario-a",
        "entity": "Order",
        "operation": "list",
        "filters": [{"field": "status", "operator": "eq", "value": "VOID"}],
        "limit": 5
    }));

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.request_id.as_deref(), Some("scenario-a"));
    assert_eq!(ids(result.rows()), vec![125, 120, 115, 110, 105]);

    let pagination = result.pagination.as_ref().unwrap();
    assert_eq!(pagination.total_rows, Some(25));
    assert_eq!(pagination.total_pages, Some(5));
    assert!(pagination.has_more);
    assert!(pagination.query_token.is_some());
}

/// Between on a numeric field is inclusive at both ends
#[test]
fn test_between_range() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "scenario-c",
        "entity": "Order",
        "operation": "list",
        "filters": [{"field": "totalAmount", "operator": "between", "value": [100, 1000]}],
        "orderBy": [{"field": "totalAmount", "direction": "asc"}]
    }));

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.rows().len(), 10);
    assert_eq!(ids(result.rows())[0], 10);
    assert_eq!(result.metadata.as_ref().unwrap().total_rows, Some(91));
}

/// IN keeps the list as separate bound values
#[test]
fn test_in_list() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "in-list",
        "entity": "Order",
        "operation": "list",
        "filters": [{"field": "id", "operator": "in", "value": [3, 7, 500]}],
        "orderBy": [{"field": "id", "direction": "asc"}]
    }));

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(ids(result.rows()), vec![3, 7]);

    let pagination = result.pagination.as_ref().unwrap();
    assert!(!pagination.has_more);
    assert!(pagination.query_token.is_none());
}

/// Search uses substring matching
#[test]
fn test_search_substring() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "search",
        "entity": "Order",
        "operation": "search",
        "filters": [{"field": "status", "operator": "like", "value": "AI"}]
    }));

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.metadata.as_ref().unwrap().total_rows, Some(50));
    assert!(result
        .rows()
        .iter()
        .all(|row| row.get("status") == Some(&json!("PAID"))));
}

/// `_` and `%` in a search value match themselves
#[test]
fn test_search_wildcards_are_literal() {
    let fx = Fixture::new();
    let underscore = fx.run(json!({
        "requestId": "search-underscore",
        "entity": "Note",
        "operation": "search",
        "filters": [{"field": "body", "operator": "like", "value": "a_b"}]
    }));
    assert!(underscore.is_success(), "{:?}", underscore.error());
    assert_eq!(ids(underscore.rows()), vec![21]);

    let percent = fx.run(json!({
        "requestId": "search-percent",
        "entity": "Note",
        "operation": "search",
        "filters": [{"field": "body", "operator": "like", "value": "50%"}]
    }));
    assert!(percent.is_success(), "{:?}", percent.error());
    assert_eq!(ids(percent.rows()), vec![23]);
    assert_eq!(percent.metadata.as_ref().unwrap().total_rows, Some(1));
}

/// Time range with bare dates selects events inside the window
#[test]
fn test_time_range_window() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "audit",
        "entity": "AuditEvent",
        "operation": "list",
        "timeRange": {"start": "2024-01-01", "end": "2024-01-31"}
    }));

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.rows().len(), 2);
    assert!(!result.pagination.as_ref().unwrap().has_more);
}

// =============================================================================
// Aggregation
// =============================================================================

/// Grouped count returns one row per group under caller aliases
#[test]
fn test_grouped_count() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "scenario-b",
        "entity": "Order",
        "operation": "aggregate",
        "aggregations": [{"function": "count", "field": "*", "alias": "orderCount"}],
        "groupBy": ["status"],
        "limit": 100
    }));

    assert!(result.is_success(), "{:?}", result.error());
    let groups = result.rows();
    assert_eq!(groups.len(), 3);

    let total: u64 = groups
        .iter()
        .map(|row| row.get("orderCount").and_then(Value::as_u64).unwrap())
        .sum();
    assert_eq!(total, ORDER_COUNT);
    assert!(groups.iter().all(|row| row.contains_key("status")));

    let pagination = result.pagination.as_ref().unwrap();
    assert_eq!(pagination.total_rows, Some(3));
    assert!(!pagination.has_more);

    let body = serde_json::to_value(&result).unwrap();
    assert!(body["data"]["aggregations"].is_array());
}

/// Sum and max over a filtered set
#[test]
fn test_sum_and_max() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "revenue",
        "entity": "Order",
        "operation": "aggregate",
        "filters": [{"field": "id", "operator": "lte", "value": 4}],
        "aggregations": [
            {"function": "sum", "field": "totalAmount", "alias": "Revenue"},
            {"function": "max", "field": "totalAmount", "alias": "largest"}
        ]
    }));

    assert!(result.is_success(), "{:?}", result.error());
    let row = &result.rows()[0];
    assert_eq!(row.get("Revenue").and_then(Value::as_f64), Some(100.0));
    assert_eq!(row.get("largest").and_then(Value::as_f64), Some(40.0));
}

// =============================================================================
// Deep Pagination
// =============================================================================

/// 125 rows at page size 10: thirteen pages, tokens advance by one page each
#[test]
fn test_token_walk_covers_every_row() {
    let fx = Fixture::new();
    let first = fx.run(json!({
        "requestId": "scenario-d",
        "entity": "Order",
        "operation": "list",
        "limit": 10
    }));

    assert!(first.is_success(), "{:?}", first.error());
    let info = first.pagination.as_ref().unwrap();
    assert_eq!(info.total_pages, Some(13));
    assert_eq!(info.current_page, 1);
    assert!(info.has_more);

    let mut seen = ids(first.rows());
    let mut token = first.query_token().unwrap().to_string();
    let mut pages = 1;

    loop {
        let page = fx.page("scenario-d", &token);
        assert!(page.is_success(), "{:?}", page.error());
        pages += 1;

        let info = page.pagination.as_ref().unwrap();
        assert_eq!(info.current_page, pages);
        assert_eq!(info.current_offset, (pages - 1) * 10);
        assert_eq!(info.total_rows, Some(ORDER_COUNT));
        seen.extend(ids(page.rows()));

        // Consumed tokens never come back
        let replay = fx.page("scenario-d", &token);
        assert_eq!(replay.error().unwrap().code(), QueryErrorCode::InvalidToken);

        match page.query_token() {
            Some(next) => token = next.to_string(),
            None => {
                assert!(!info.has_more);
                break;
            }
        }
    }

    assert_eq!(pages, 13);
    assert_eq!(seen.len() as u64, ORDER_COUNT);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len() as u64, ORDER_COUNT);
    assert!(fx.service.pagination.is_empty());
}

/// Entities without a default order still page through every row once
#[test]
fn test_token_walk_without_default_order() {
    let fx = Fixture::new();
    let first = fx.run(json!({
        "requestId": "notes",
        "entity": "Note",
        "operation": "list",
        "limit": 5
    }));
    assert!(first.is_success(), "{:?}", first.error());
    assert_eq!(first.pagination.as_ref().unwrap().total_pages, Some(5));

    let mut rows = first.rows().to_vec();
    let mut token = first.query_token().map(str::to_string);
    let mut pages = 1;
    while let Some(current) = token {
        let page = fx.page("notes", &current);
        assert!(page.is_success(), "{:?}", page.error());
        pages += 1;
        rows.extend(page.rows().iter().cloned());
        token = page.query_token().map(str::to_string);
    }
    assert_eq!(pages, 5);

    let mut seen = ids(&rows);
    assert_eq!(seen.len() as u64, NOTE_COUNT);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len() as u64, NOTE_COUNT);

    // Pages follow one total order: body, then id
    let keys: Vec<(String, i64)> = rows
        .iter()
        .map(|row| {
            (
                row.get("body").and_then(Value::as_str).unwrap().to_string(),
                row.get("id").and_then(Value::as_i64).unwrap(),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

/// An exact multiple of the page size ends on an empty page
#[test]
fn test_exact_multiple_ends_empty() {
    let fx = Fixture::new();
    let first = fx.run(json!({
        "requestId": "multiple",
        "entity": "Order",
        "operation": "list",
        "filters": [{"field": "status", "operator": "eq", "value": "VOID"}],
        "limit": 25
    }));
    assert_eq!(first.rows().len(), 25);

    let last = fx.page("multiple", first.query_token().unwrap());
    assert!(last.is_success());
    assert!(last.rows().is_empty());
    assert!(!last.pagination.as_ref().unwrap().has_more);
    assert!(last.query_token().is_none());
}

/// Explicit offset sets the starting page
#[test]
fn test_explicit_offset() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "offset",
        "entity": "Order",
        "operation": "list",
        "orderBy": [{"field": "id", "direction": "asc"}],
        "limit": 10,
        "offset": 30
    }));

    assert_eq!(ids(result.rows())[0], 31);
    let info = result.pagination.as_ref().unwrap();
    assert_eq!(info.current_page, 4);
    assert_eq!(info.current_offset, 30);

    let next = fx.page("offset", result.query_token().unwrap());
    assert_eq!(ids(next.rows())[0], 41);
}

// =============================================================================
// Rejections
// =============================================================================

/// Missing time range on a range-required entity
#[test]
fn test_time_range_required() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "scenario-e",
        "entity": "AuditEvent",
        "operation": "list"
    }));

    assert_eq!(result.status, QueryStatus::Error);
    let err = result.error().unwrap();
    assert_eq!(err.code(), QueryErrorCode::ValidationError);
    assert_eq!(err.field(), Some("timeRange"));
    assert_eq!(fx.executor.calls(), 0);
}

/// Unknown entity, field, operator and operation make zero database calls
#[test]
fn test_rejections_skip_database() {
    let fx = Fixture::new();
    let cases = [
        (
            json!({"requestId": "r", "entity": "Invoice", "operation": "list"}),
            QueryErrorCode::InvalidEntity,
        ),
        (
            json!({"requestId": "r", "entity": "Order", "operation": "list",
                   "filters": [{"field": "order_date", "operator": "eq", "value": 1}]}),
            QueryErrorCode::InvalidField,
        ),
        (
            json!({"requestId": "r", "entity": "Order", "operation": "list",
                   "filters": [{"field": "status", "operator": "regex", "value": ".*"}]}),
            QueryErrorCode::InvalidOperator,
        ),
        (
            json!({"requestId": "r", "entity": "Order", "operation": "delete"}),
            QueryErrorCode::InvalidOperation,
        ),
        (
            json!({"requestId": "r", "entity": "Order", "operation": "list",
                   "orderBy": [{"field": "secret", "direction": "asc"}]}),
            QueryErrorCode::InvalidField,
        ),
    ];

    for (plan, code) in cases {
        let result = fx.run(plan);
        assert_eq!(result.error().unwrap().code(), code);
    }
    assert_eq!(fx.executor.calls(), 0);
    assert_eq!(fx.service.metrics.snapshot().queries_rejected, 5);
}

/// Unknown token is rejected without a database call
#[test]
fn test_unknown_token() {
    let fx = Fixture::new();
    let result = fx.page("r", "qt_not-a-real-token");
    assert_eq!(result.error().unwrap().code(), QueryErrorCode::InvalidToken);
    assert_eq!(fx.executor.calls(), 0);
}

// =============================================================================
// Injection Safety
// =============================================================================

/// Quote-breaking values match nothing and leave the table intact
#[test]
fn test_hostile_values_are_bound() {
    let fx = Fixture::new();
    let hostile = [
        "PAID' OR '1'='1",
        "x'; DROP TABLE orders; --",
        "\" OR 1=1 --",
        "%' UNION SELECT * FROM audit_events --",
    ];

    for value in hostile {
        let listed = fx.run(json!({
            "requestId": "hostile",
            "entity": "Order",
            "operation": "list",
            "filters": [{"field": "status", "operator": "eq", "value": value}]
        }));
        assert!(listed.is_success(), "{:?}", listed.error());
        assert!(listed.rows().is_empty());

        let searched = fx.run(json!({
            "requestId": "hostile",
            "entity": "Order",
            "operation": "search",
            "filters": [{"field": "status", "operator": "like", "value": value}]
        }));
        assert!(searched.is_success(), "{:?}", searched.error());
        assert!(searched.rows().is_empty());
    }

    assert_eq!(fx.raw_order_count(), ORDER_COUNT);
}

/// Hostile alias text stays inside its quoted identifier
#[test]
fn test_hostile_alias() {
    let fx = Fixture::new();
    let result = fx.run(json!({
        "requestId": "alias",
        "entity": "Order",
        "operation": "aggregate",
        "aggregations": [{"function": "count", "field": "*", "alias": "n\" FROM orders; DROP TABLE orders; --"}]
    }));

    assert!(result.is_success(), "{:?}", result.error());
    let row = &result.rows()[0];
    assert_eq!(
        row.get("n\" FROM orders; DROP TABLE orders; --").and_then(Value::as_u64),
        Some(ORDER_COUNT)
    );
    assert_eq!(fx.raw_order_count(), ORDER_COUNT);
}
