//! SQL Compiler subsystem
//!
//! Produces a [`CompiledStatement`] (SQL text + positional parameters) for
//! list, search and aggregate plans, plus the sibling COUNT statement used
//! for totals.
//!
//! # Invariants
//!
//! - No caller value is ever concatenated into SQL text
//! - Only mapped identifiers appear in SQL text
//! - Compilation is a pure function of the plan

mod compiler;
mod errors;
mod statement;
mod time;

pub use compiler::{quote_alias, SqlCompiler};
pub use errors::{CompileError, CompileResult};
pub use statement::{CompiledStatement, SqlValue};
pub use time::parse_time_bound;
