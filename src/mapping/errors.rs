//! # Mapping Errors
//!
//! Raised while loading or registering entity mappings. These are startup
//! failures; a request never observes them.

use thiserror::Error;

pub type MappingResult<T> = Result<T, MappingError>;

#[derive(Debug, Error)]
pub enum MappingError {
    /// Mapping file could not be read
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file is not valid JSON for the mapping document
    #[error("Invalid mapping document {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Mapping is structurally invalid
    #[error("Malformed mapping for entity '{entity}': {reason}")]
    Malformed { entity: String, reason: String },

    /// Entity registered twice
    #[error("Entity '{0}' is already registered")]
    DuplicateEntity(String),
}

impl MappingError {
    pub fn malformed(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError::Malformed {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
