//! Service assembly
//!
//! Builds the shared components in dependency order:
//!
//! 1. Mapping registry (from the mapping file)
//! 2. Executor (SQLite, or any injected [`StatementExecutor`])
//! 3. Compiler and pagination store
//! 4. Orchestrator
//!
//! The sweeper is not started here; it needs a tokio runtime.

use std::sync::Arc;

use thiserror::Error;

use crate::compiler::SqlCompiler;
use crate::config::ServiceConfig;
use crate::executor::{ExecutorError, SqliteExecutor, StatementExecutor};
use crate::mapping::{MappingError, MappingRegistry};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::orchestrator::QueryOrchestrator;
use crate::pagination::{Clock, PaginationStore, SystemClock};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

pub struct Service {
    pub registry: Arc<MappingRegistry>,
    pub compiler: Arc<SqlCompiler>,
    pub pagination: Arc<PaginationStore>,
    pub orchestrator: Arc<QueryOrchestrator>,
    pub metrics: Arc<MetricsRegistry>,
}

impl Service {
    /// Loads the mapping and opens the configured SQLite database.
    pub fn assemble(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let registry = load_registry(config)?;
        let executor = SqliteExecutor::open(config.database_file())?;
        Ok(Self::with_executor(
            config,
            registry,
            Arc::new(executor),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_executor(
        config: &ServiceConfig,
        registry: MappingRegistry,
        executor: Arc<dyn StatementExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limits = config.limits();
        let registry = Arc::new(registry);
        let metrics = Arc::new(MetricsRegistry::new());
        let compiler = Arc::new(SqlCompiler::new(registry.clone(), limits));
        let pagination = Arc::new(
            PaginationStore::new(config.pagination.clone(), compiler.clone(), clock)
                .with_metrics(metrics.clone()),
        );
        let orchestrator = Arc::new(QueryOrchestrator::new(
            compiler.clone(),
            executor,
            pagination.clone(),
            metrics.clone(),
        ));

        Self {
            registry,
            compiler,
            pagination,
            orchestrator,
            metrics,
        }
    }
}

/// Loads the mapping registry named by `config`
pub fn load_registry(config: &ServiceConfig) -> Result<MappingRegistry, MappingError> {
    let path = config.mapping_file();
    let registry = MappingRegistry::load(&path)?;
    log_event_with_fields(
        Event::MappingLoaded,
        &[
            ("path", &path.display().to_string()),
            ("entities", &registry.len().to_string()),
        ],
    );
    Ok(registry)
}
