//! Mapping Registry
//!
//! Logical entity and field names are the only names callers ever use.
//! This registry is the whitelist that turns them into physical tables and
//! columns; anything not in it cannot reach SQL.

mod errors;
mod registry;
mod types;

pub use errors::{MappingError, MappingResult};
pub use registry::MappingRegistry;
pub use types::{is_valid_identifier, EntityMapping, TIMESTAMP_FIELD};
