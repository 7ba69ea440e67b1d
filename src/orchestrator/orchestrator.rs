//! Query Orchestrator
//!
//! One `execute` call per request:
//!
//! 1. `queryToken` set: claim the token, run its stored statement, rotate if
//!    more rows may remain. Nothing else in the plan is read.
//! 2. Otherwise validate, compile, run the page and count statements, and
//!    issue a token when the page came back full.
//!
//! Validation and token failures execute nothing. Execution failures are
//! logged with SQL and parameters; the caller only sees the error class.

use std::sync::Arc;
use std::time::Instant;

use crate::compiler::{CompiledStatement, SqlCompiler};
use crate::executor::{ExecutorError, Row, StatementExecutor};
use crate::observability::{log_event_at, log_event_with_fields, Event, MetricsRegistry, Severity};
use crate::pagination::{
    page_number, total_pages, PaginationContext, PaginationError, PaginationStore,
};
use crate::plan::{Operation, PlanResult, PlanValidator, QueryError, QueryPlan};

use super::result::{PaginationInfo, QueryData, QueryResult, ResultMetadata};

/// A served page before timing is attached
struct Page {
    data: QueryData,
    total_rows: u64,
    pagination: PaginationInfo,
}

pub struct QueryOrchestrator {
    compiler: Arc<SqlCompiler>,
    executor: Arc<dyn StatementExecutor>,
    pagination: Arc<PaginationStore>,
    metrics: Arc<MetricsRegistry>,
}

impl QueryOrchestrator {
    /// `compiler` is the one the pagination store compiles with; plans are
    /// validated against its registry and limits.
    pub fn new(
        compiler: Arc<SqlCompiler>,
        executor: Arc<dyn StatementExecutor>,
        pagination: Arc<PaginationStore>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            compiler,
            executor,
            pagination,
            metrics,
        }
    }

    pub fn compiler(&self) -> &Arc<SqlCompiler> {
        &self.compiler
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn pagination(&self) -> &PaginationStore {
        &self.pagination
    }

    /// Runs one plan. Never panics on caller input; every failure becomes
    /// an error result.
    pub fn execute(&self, plan: &QueryPlan) -> QueryResult {
        let started = Instant::now();
        let request_id = plan.request_id.clone();

        let outcome = match plan.query_token.as_deref() {
            Some(token) => self.execute_page(plan.request_id(), token),
            None => self.execute_plan(plan),
        };

        match outcome {
            Ok(page) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let rows_returned = page.data.len() as u64;
                self.metrics.increment_queries_executed();
                self.metrics.add_rows_returned(rows_returned);
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("request_id", plan.request_id()),
                        ("rows", &rows_returned.to_string()),
                        ("total_rows", &page.total_rows.to_string()),
                        ("has_more", &page.pagination.has_more.to_string()),
                        ("page", &page.pagination.current_page.to_string()),
                        ("elapsed_ms", &elapsed_ms.to_string()),
                    ],
                );
                QueryResult::success(
                    request_id,
                    page.data,
                    ResultMetadata {
                        execution_time_ms: elapsed_ms,
                        rows_returned,
                        total_rows: Some(page.total_rows),
                    },
                    page.pagination,
                )
            }
            Err(err) => QueryResult::failure(request_id, err),
        }
    }

    fn execute_plan(&self, plan: &QueryPlan) -> PlanResult<Page> {
        let validator = PlanValidator::new(self.compiler.registry(), self.compiler.limits());
        validator
            .validate(plan)
            .map_err(|err| self.rejected(plan.request_id(), err))?;

        let page_size = validator.effective_limit(plan);
        let statement = self
            .compiler
            .compile(plan)
            .map_err(|err| self.rejected(plan.request_id(), err.into()))?;
        let count = self
            .compiler
            .compile_count(plan)
            .map_err(|err| self.rejected(plan.request_id(), err.into()))?;

        log_compiled(plan.request_id(), &statement);

        let rows = self
            .executor
            .execute_statement(&statement)
            .map_err(|err| self.execution_failed(plan.request_id(), &statement, err))?;
        let total_rows = self
            .executor
            .execute_count(&count)
            .map_err(|err| self.execution_failed(plan.request_id(), &count, err))?;

        let offset = plan.offset.unwrap_or(0);
        let has_more = rows.len() as u64 >= page_size;
        let query_token = if has_more {
            Some(
                self.pagination
                    .issue(plan, page_size, total_rows)
                    .map_err(|err| self.token_failed(plan.request_id(), err))?,
            )
        } else {
            None
        };

        Ok(Page {
            data: shape(plan.operation.as_ref(), rows),
            total_rows,
            pagination: PaginationInfo {
                query_token,
                has_more,
                current_page: page_number(offset, page_size),
                current_offset: offset,
                total_pages: Some(total_pages(total_rows, page_size)),
                total_rows: Some(total_rows),
                page_size: Some(page_size),
            },
        })
    }

    fn execute_page(&self, request_id: &str, token: &str) -> PlanResult<Page> {
        let context = self
            .pagination
            .resolve(token)
            .map_err(|err| self.token_failed(request_id, err))?
            .ok_or_else(|| {
                self.metrics.increment_tokens_rejected();
                self.rejected(request_id, QueryError::invalid_token())
            })?;

        let statement = context.statement();
        let rows = self
            .executor
            .execute_statement(&statement)
            .map_err(|err| self.execution_failed(request_id, &statement, err))?;

        let has_more = rows.len() as u64 >= context.page_size;
        let query_token = if has_more {
            Some(
                self.pagination
                    .rotate(&context)
                    .map_err(|err| self.token_failed(request_id, err))?,
            )
        } else {
            None
        };

        Ok(Page {
            data: shape(context.original_plan.operation.as_ref(), rows),
            total_rows: context.total_rows,
            pagination: page_info(&context, query_token, has_more),
        })
    }

    fn rejected(&self, request_id: &str, err: QueryError) -> QueryError {
        self.metrics.increment_queries_rejected();
        log_event_at(
            Severity::Warn,
            Event::PlanRejected,
            &[
                ("request_id", request_id),
                ("code", err.code().code()),
                ("field", err.field().unwrap_or("")),
            ],
        );
        err
    }

    fn execution_failed(
        &self,
        request_id: &str,
        statement: &CompiledStatement,
        err: ExecutorError,
    ) -> QueryError {
        self.metrics.increment_queries_failed();
        log_event_at(
            Severity::Error,
            Event::ExecutionFailed,
            &[
                ("request_id", request_id),
                ("sql", &statement.sql),
                ("params", &statement.params_json()),
                ("kind", err.kind()),
                ("error", &err.to_string()),
            ],
        );
        QueryError::execution(err.kind())
    }

    fn token_failed(&self, request_id: &str, err: PaginationError) -> QueryError {
        self.metrics.increment_queries_failed();
        log_event_at(
            Severity::Error,
            Event::TokenFailed,
            &[
                ("request_id", request_id),
                ("kind", err.kind()),
                ("error", &err.to_string()),
            ],
        );
        QueryError::execution(err.kind())
    }
}

fn log_compiled(request_id: &str, statement: &CompiledStatement) {
    log_event_at(
        Severity::Trace,
        Event::StatementCompiled,
        &[("request_id", request_id), ("sql", &statement.sql)],
    );
}

fn shape(operation: Option<&Operation>, rows: Vec<Row>) -> QueryData {
    match operation {
        Some(Operation::Aggregate) => QueryData::Aggregations { aggregations: rows },
        _ => QueryData::Rows { rows },
    }
}

fn page_info(context: &PaginationContext, query_token: Option<String>, has_more: bool) -> PaginationInfo {
    PaginationInfo {
        query_token,
        has_more,
        current_page: context.current_page,
        current_offset: context.current_offset,
        total_pages: Some(context.total_pages()),
        total_rows: Some(context.total_rows),
        page_size: Some(context.page_size),
    }
}
