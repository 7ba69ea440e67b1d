//! Query Orchestrator subsystem
//!
//! The single entry point callers use: `execute(QueryPlan) -> QueryResult`.

mod orchestrator;
mod result;

pub use orchestrator::QueryOrchestrator;
pub use result::{PaginationInfo, QueryData, QueryResult, QueryStatus, ResultMetadata};
