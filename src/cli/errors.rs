//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::mapping::MappingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// Mapping file missing or invalid
    MappingError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// The plan was rejected or failed
    QueryFailed,
    /// Runtime, database or server failed to start
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QG_CLI_CONFIG_ERROR",
            Self::MappingError => "QG_CLI_MAPPING_ERROR",
            Self::IoError => "QG_CLI_IO_ERROR",
            Self::QueryFailed => "QG_CLI_QUERY_FAILED",
            Self::BootFailed => "QG_CLI_BOOT_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn mapping_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::MappingError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::QueryFailed, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<MappingError> for CliError {
    fn from(e: MappingError) -> Self {
        Self::mapping_error(e.to_string())
    }
}

impl From<ExecutorError> for CliError {
    fn from(e: ExecutorError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
