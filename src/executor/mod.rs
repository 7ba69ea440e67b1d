//! Statement executor subsystem
//!
//! [`StatementExecutor`] is the only path from a compiled statement to the
//! relational store. [`SqliteExecutor`] is the bundled implementation.

mod errors;
mod executor;
mod sqlite;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{Row, StatementExecutor};
pub use sqlite::SqliteExecutor;
