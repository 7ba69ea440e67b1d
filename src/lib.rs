//! querygate - entity-based, injection-safe queries over relational stores
//!
//! Callers describe queries as logical [`plan::QueryPlan`]s. Every entity and
//! field name is checked against the [`mapping::MappingRegistry`], the plan is
//! compiled to parameterized SQL, and large results are paged through
//! single-use, expiring tokens.
//!
//! ```text
//! QueryPlan -> PlanValidator -> SqlCompiler -> StatementExecutor
//!                                   |
//!                           PaginationStore (next-page statements)
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod executor;
pub mod http_server;
pub mod mapping;
pub mod observability;
pub mod orchestrator;
pub mod pagination;
pub mod plan;
pub mod service;
