//! Shared fixture: an in-memory SQLite store seeded with 125 orders, a few
//! audit events and some notes, wired through the same assembly path the CLI uses.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use querygate::compiler::SqlValue;
use querygate::config::ServiceConfig;
use querygate::executor::{ExecutorResult, Row, SqliteExecutor, StatementExecutor};
use querygate::mapping::MappingRegistry;
use querygate::orchestrator::QueryResult;
use querygate::pagination::ManualClock;
use querygate::plan::QueryPlan;
use querygate::service::Service;
use serde_json::Value;

pub const ORDER_COUNT: u64 = 125;

pub const MAPPING: &str = r#"{
  "entities": {
    "Order": {
      "table": "orders",
      "fields": {
        "id": "id",
        "status": "status",
        "totalAmount": "total_amount",
        "orderDate": "order_date",
        "customerId": "customer_id"
      },
      "defaultOrderBy": "order_date DESC"
    },
    "AuditEvent": {
      "table": "audit_events",
      "fields": {
        "timestamp": "occurred_at",
        "action": "action",
        "actor": "actor"
      },
      "timeRangeRequired": true
    },
    "Note": {
      "table": "notes",
      "fields": {
        "id": "id",
        "body": "body"
      }
    }
  }
}"#;

pub const NOTE_COUNT: u64 = 24;

const SEED: &str = "
CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    status TEXT NOT NULL,
    total_amount REAL NOT NULL,
    order_date TEXT NOT NULL,
    customer_id INTEGER NOT NULL
);
WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 125)
INSERT INTO orders (id, status, total_amount, order_date, customer_id)
SELECT n,
       CASE WHEN n % 5 = 0 THEN 'VOID' WHEN n % 5 IN (1, 2) THEN 'PAID' ELSE 'PENDING' END,
       n * 10.0,
       strftime('%Y-%m-%dT%H:%M:%fZ', '2024-01-01 00:00:00', '+' || n || ' hours'),
       n % 7
FROM seq;

CREATE TABLE audit_events (occurred_at TEXT NOT NULL, action TEXT NOT NULL, actor TEXT NOT NULL);
INSERT INTO audit_events VALUES ('2024-01-05T10:00:00.000Z', 'login', 'ann');
INSERT INTO audit_events VALUES ('2024-01-20T08:00:00.000Z', 'logout', 'ann');
INSERT INTO audit_events VALUES ('2024-02-03T12:00:00.000Z', 'login', 'bo');

CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL);
WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 20)
INSERT INTO notes (id, body) SELECT n, 'note ' || (n % 4) FROM seq;
INSERT INTO notes VALUES (21, 'a_b');
INSERT INTO notes VALUES (22, 'axb');
INSERT INTO notes VALUES (23, '50% off');
INSERT INTO notes VALUES (24, '500 off');
";

/// Counts round-trips so tests can assert that rejected plans never reach the store
pub struct CountingExecutor {
    pub inner: SqliteExecutor,
    calls: AtomicUsize,
}

impl CountingExecutor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatementExecutor for CountingExecutor {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(sql, params)
    }

    fn execute_scalar(&self, sql: &str, params: &[SqlValue]) -> ExecutorResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute_scalar(sql, params)
    }
}

pub struct Fixture {
    pub service: Service,
    pub executor: Arc<CountingExecutor>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::new("mapping.json"))
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let registry = MappingRegistry::from_json_str(MAPPING).unwrap();
        let inner = SqliteExecutor::open_in_memory().unwrap();
        inner.execute_batch(SEED).unwrap();

        let executor = Arc::new(CountingExecutor {
            inner,
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::default());
        let service = Service::with_executor(&config, registry, executor.clone(), clock.clone());

        Self {
            service,
            executor,
            clock,
        }
    }

    /// Runs a plan given as caller JSON
    pub fn run(&self, plan: Value) -> QueryResult {
        let plan: QueryPlan = serde_json::from_value(plan).unwrap();
        self.service.orchestrator.execute(&plan)
    }

    pub fn page(&self, request_id: &str, token: &str) -> QueryResult {
        self.service
            .orchestrator
            .execute(&QueryPlan::continuation(request_id, token))
    }

    /// Order count straight from the table, bypassing the orchestrator
    pub fn raw_order_count(&self) -> u64 {
        self.executor
            .inner
            .execute_scalar("SELECT COUNT(*) FROM orders", &[])
            .unwrap()
    }
}
