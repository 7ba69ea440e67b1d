//! # Pagination Store
//!
//! Process-local map of token to [`PaginationContext`].
//!
//! ## Token lifecycle
//!
//! `issued -> claimed -> rotated | dropped`, or `issued -> expired`.
//!
//! - `resolve` claims: the context is removed under the write lock, so two
//!   concurrent page requests with one token never both receive the page.
//!   The loser sees `None`.
//! - Expiry is `created_at + ttl`, checked on `resolve` and by `sweep`.
//! - Contents are not durable; a restart invalidates every token.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::compiler::SqlCompiler;
use crate::observability::{log_event_at, log_event_with_fields, Event, MetricsRegistry, Severity};
use crate::plan::QueryPlan;

use super::clock::Clock;
use super::config::PaginationConfig;
use super::context::{page_number, PaginationContext};
use super::errors::{PaginationError, PaginationResult};
use super::token::{fingerprint, generate_token};

pub struct PaginationStore {
    config: PaginationConfig,
    compiler: Arc<SqlCompiler>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<MetricsRegistry>>,
    contexts: RwLock<HashMap<String, PaginationContext>>,
}

impl PaginationStore {
    pub fn new(config: PaginationConfig, compiler: Arc<SqlCompiler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            compiler,
            clock,
            metrics: None,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Stores the page after the one `plan` just returned and hands back its token.
    ///
    /// The stored statement starts at `plan.offset + page_size`.
    pub fn issue(&self, plan: &QueryPlan, page_size: u64, total_rows: u64) -> PaginationResult<String> {
        if page_size == 0 {
            return Err(PaginationError::InvalidPageSize);
        }
        let next_offset = plan.offset.unwrap_or(0).saturating_add(page_size);
        let context = self.build_context(plan, page_size, next_offset, total_rows)?;
        let token = context.token.clone();

        self.contexts
            .write()
            .map_err(|_| PaginationError::poisoned())?
            .insert(token.clone(), context);

        if let Some(metrics) = &self.metrics {
            metrics.increment_tokens_issued();
        }
        log_event_with_fields(
            Event::TokenIssued,
            &[
                ("token", &fingerprint(&token)),
                ("entity", plan.entity_name()),
                ("offset", &next_offset.to_string()),
                ("page_size", &page_size.to_string()),
            ],
        );
        Ok(token)
    }

    /// Claims the context for `token`.
    ///
    /// Returns `None` for unknown, already claimed, or expired tokens. An
    /// expired context is dropped here even if no sweep has run.
    pub fn resolve(&self, token: &str) -> PaginationResult<Option<PaginationContext>> {
        let claimed = self
            .contexts
            .write()
            .map_err(|_| PaginationError::poisoned())?
            .remove(token);

        let Some(context) = claimed else {
            log_event_at(
                Severity::Warn,
                Event::TokenRejected,
                &[("token", &fingerprint(token)), ("reason", "unknown_or_consumed")],
            );
            return Ok(None);
        };

        if context.is_expired(self.clock.now()) {
            if let Some(metrics) = &self.metrics {
                metrics.add_tokens_expired(1);
            }
            log_event_at(
                Severity::Warn,
                Event::TokenRejected,
                &[("token", &fingerprint(token)), ("reason", "expired")],
            );
            return Ok(None);
        }

        Ok(Some(context))
    }

    /// Stores the page after `context` under a fresh token and removes the old one.
    pub fn rotate(&self, context: &PaginationContext) -> PaginationResult<String> {
        let next_offset = context.current_offset.saturating_add(context.page_size);
        let next = self.build_context(
            &context.original_plan,
            context.page_size,
            next_offset,
            context.total_rows,
        )?;
        let token = next.token.clone();

        {
            let mut contexts = self.contexts.write().map_err(|_| PaginationError::poisoned())?;
            contexts.remove(&context.token);
            contexts.insert(token.clone(), next);
        }

        if let Some(metrics) = &self.metrics {
            metrics.increment_tokens_rotated();
        }
        log_event_with_fields(
            Event::TokenRotated,
            &[
                ("from", &fingerprint(&context.token)),
                ("to", &fingerprint(&token)),
                ("offset", &next_offset.to_string()),
            ],
        );
        Ok(token)
    }

    /// Removes every expired context; returns how many were removed.
    pub fn sweep(&self) -> PaginationResult<usize> {
        let now = self.clock.now();
        let removed = {
            let mut contexts = self.contexts.write().map_err(|_| PaginationError::poisoned())?;
            let before = contexts.len();
            contexts.retain(|_, ctx| !ctx.is_expired(now));
            before - contexts.len()
        };

        if removed > 0 {
            if let Some(metrics) = &self.metrics {
                metrics.add_tokens_expired(removed as u64);
            }
            log_event_with_fields(Event::TokenSweep, &[("removed", &removed.to_string())]);
        }
        Ok(removed)
    }

    /// Live contexts, expired-but-unswept included
    pub fn len(&self) -> usize {
        self.contexts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, token: &str) -> bool {
        self.contexts
            .read()
            .map(|c| c.contains_key(token))
            .unwrap_or(false)
    }

    fn build_context(
        &self,
        plan: &QueryPlan,
        page_size: u64,
        offset: u64,
        total_rows: u64,
    ) -> PaginationResult<PaginationContext> {
        let mut original_plan = plan.clone();
        original_plan.query_token = None;

        let mut page_plan = original_plan.clone();
        page_plan.limit = Some(page_size);
        page_plan.offset = Some(offset);
        let statement = self.compiler.compile(&page_plan)?;

        let created_at = self.clock.now();
        Ok(PaginationContext {
            token: generate_token(&self.config.token_prefix),
            sql: statement.sql,
            params: statement.params,
            page_size,
            current_page: page_number(offset, page_size),
            current_offset: offset,
            total_rows,
            created_at,
            expires_at: created_at + self.config.ttl(),
            original_plan,
        })
    }
}
