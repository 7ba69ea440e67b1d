//! JSON I/O for CLI commands
//!
//! - Plans come from a file or, for "-", stdin
//! - Output is one JSON object per line on stdout

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::plan::QueryPlan;

use super::errors::{CliError, CliResult};

const STDIN_PATH: &str = "-";

/// Read a QueryPlan from `path`, or stdin when `path` is "-"
pub fn read_plan(path: &Path) -> CliResult<QueryPlan> {
    let content = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| CliError::io_error(format!("Failed to read plan {:?}: {}", path, e)))?
    };

    if content.trim().is_empty() {
        return Err(CliError::io_error("Empty plan"));
    }
    parse_plan(&content)
}

pub fn parse_plan(content: &str) -> CliResult<QueryPlan> {
    Ok(serde_json::from_str(content)?)
}

/// Write one JSON value to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
