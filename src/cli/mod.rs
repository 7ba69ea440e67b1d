//! CLI module for querygate
//!
//! - serve: HTTP server plus token sweeper
//! - query: one-shot plan execution
//! - compile: one-shot validation and compilation, no database
//! - check: configuration and mapping check

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, compile, query, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_plan, read_plan, write_json};
