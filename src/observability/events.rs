//! Observable events
//!
//! Every log line emitted by querygate names one of these events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration file loaded
    ConfigLoaded,
    /// Entity mappings loaded
    MappingLoaded,
    /// HTTP server bound and serving
    ServerStart,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Query processing
    /// Plan failed validation or compilation
    PlanRejected,
    /// Statement compiled
    StatementCompiled,
    /// Query executed successfully
    QueryExecuted,
    /// Store rejected or failed the statement
    ExecutionFailed,

    // Pagination
    /// Continuation token issued for a fresh query
    TokenIssued,
    /// Continuation token replaced by its successor
    TokenRotated,
    /// Token unknown, consumed or expired
    TokenRejected,
    /// Token could not be issued or rotated
    TokenFailed,
    /// Periodic sweep removed expired tokens
    TokenSweep,
    /// Sweeper task started
    SweeperStart,
    /// Sweeper task stopped
    SweeperStop,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::MappingLoaded => "MAPPING_LOADED",
            Event::ServerStart => "SERVER_START",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::PlanRejected => "PLAN_REJECTED",
            Event::StatementCompiled => "STATEMENT_COMPILED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::ExecutionFailed => "EXECUTION_FAILED",
            Event::TokenIssued => "TOKEN_ISSUED",
            Event::TokenRotated => "TOKEN_ROTATED",
            Event::TokenRejected => "TOKEN_REJECTED",
            Event::TokenFailed => "TOKEN_FAILED",
            Event::TokenSweep => "TOKEN_SWEEP",
            Event::SweeperStart => "SWEEPER_START",
            Event::SweeperStop => "SWEEPER_STOP",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
