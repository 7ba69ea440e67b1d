//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::compiler::SqlCompiler;
use crate::config::ServiceConfig;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::pagination::Sweeper;
use crate::plan::{PlanValidator, QueryError};
use crate::service::{load_registry, Service, ServiceError};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_plan, write_json};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query { config, plan } => query(&config, &plan),
        Command::Compile { config, plan } => compile(&config, &plan),
        Command::Check { config } => check(&config),
    }
}

fn load_config(path: &Path) -> CliResult<ServiceConfig> {
    let config = ServiceConfig::load(path)?;
    log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
    Ok(config)
}

fn assemble(config: &ServiceConfig) -> CliResult<Service> {
    Service::assemble(config).map_err(|e| match e {
        ServiceError::Mapping(e) => CliError::from(e),
        ServiceError::Executor(e) => CliError::from(e),
    })
}

/// Start the HTTP server and token sweeper; stops on Ctrl-C
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }
    let service = assemble(&config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let sweeper = Sweeper::spawn(service.pagination.clone());
        let server = HttpServer::new(config.http.clone(), service.orchestrator.clone());

        let served = server
            .start(async {
                let _ = tokio::signal::ctrl_c().await;
                log_event(Event::ShutdownStart);
            })
            .await;

        sweeper.shutdown().await;
        log_event(Event::ShutdownComplete);
        served.map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Execute one plan and print the QueryResult
pub fn query(config_path: &Path, plan_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let service = assemble(&config)?;
    let plan = read_plan(plan_path)?;

    let result = service.orchestrator.execute(&plan);
    write_json(&result)?;

    match result.error() {
        None => Ok(()),
        Some(err) => Err(CliError::query_failed(err.code().code())),
    }
}

/// Validate and compile one plan; prints the page and count statements
pub fn compile(config_path: &Path, plan_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config)?;
    let plan = read_plan(plan_path)?;
    let limits = config.limits();

    let validated = PlanValidator::new(&registry, limits).validate(&plan);
    let compiled = validated.and_then(|()| {
        let compiler = SqlCompiler::new(Arc::new(registry), limits);
        let statement = compiler.compile(&plan).map_err(QueryError::from)?;
        let count = compiler.compile_count(&plan).map_err(QueryError::from)?;
        Ok((statement, count))
    });

    match compiled {
        Ok((statement, count)) => write_json(&json!({
            "statement": statement,
            "count": count,
        })),
        Err(err) => {
            write_json(&json!({ "error": err }))?;
            Err(CliError::query_failed(err.code().code()))
        }
    }
}

/// Load config and mapping; list entities with their fields
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config)?;

    let entities: Vec<_> = registry
        .entity_names()
        .filter_map(|name| {
            registry.entity(name).map(|mapping| {
                json!({
                    "entity": name,
                    "fields": mapping.fields.keys().collect::<Vec<_>>(),
                    "timeRangeRequired": mapping.time_range_required,
                })
            })
        })
        .collect();

    write_json(&json!({ "entities": entities }))
}
