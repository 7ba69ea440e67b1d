//! Mapping registry loaded once at startup
//!
//! The mapping file is a JSON document:
//!
//! ```json
//! { "entities": { "Order": { "table": "orders", "fields": { "status": "status" } } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::errors::{MappingError, MappingResult};
use super::types::EntityMapping;

#[derive(Debug, Deserialize)]
struct MappingDocument {
    entities: BTreeMap<String, EntityMapping>,
}

/// Logical entity name -> mapping. Immutable once shared.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    entities: BTreeMap<String, EntityMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and structurally checks every mapping in a JSON file.
    pub fn load(path: &Path) -> MappingResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_json_str(content: &str) -> MappingResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> MappingResult<Self> {
        let document: MappingDocument =
            serde_json::from_str(content).map_err(|source| MappingError::Parse {
                path: origin.to_string(),
                source,
            })?;

        let mut registry = Self::new();
        for (name, mapping) in document.entities {
            registry.register(name, mapping)?;
        }
        Ok(registry)
    }

    /// Registers one entity. Mappings are immutable: re-registering a name fails.
    pub fn register(&mut self, name: impl Into<String>, mapping: EntityMapping) -> MappingResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(MappingError::malformed(name, "entity name must not be empty"));
        }
        mapping
            .validate_structure()
            .map_err(|reason| MappingError::malformed(&name, reason))?;

        if self.entities.contains_key(&name) {
            return Err(MappingError::DuplicateEntity(name));
        }
        self.entities.insert(name, mapping);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_entity(mut self, name: impl Into<String>, mapping: EntityMapping) -> MappingResult<Self> {
        self.register(name, mapping)?;
        Ok(self)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Physical column for `entity.field`
    pub fn column(&self, entity: &str, field: &str) -> Option<&str> {
        self.entity(entity).and_then(|m| m.column(field))
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MAPPING_JSON: &str = r#"{
        "entities": {
            "Order": {
                "table": "orders",
                "fields": {"status": "status", "totalAmount": "total_amount", "orderDate": "order_date"},
                "defaultOrderBy": "order_date DESC"
            },
            "Event": {
                "table": "events",
                "fields": {"timestamp": "occurred_at", "kind": "kind"},
                "timeRangeRequired": true
            }
        }
    }"#;

    #[test]
    fn test_from_json_str() {
        let registry = MappingRegistry::from_json_str(MAPPING_JSON).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.column("Order", "totalAmount"), Some("total_amount"));
        assert!(registry.entity("Event").unwrap().time_range_required);
        assert_eq!(registry.entity_names().collect::<Vec<_>>(), vec!["Event", "Order"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MAPPING_JSON.as_bytes()).unwrap();

        let registry = MappingRegistry::load(file.path()).unwrap();
        assert!(registry.contains("Order"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = MappingRegistry::load(Path::new("/nonexistent/mapping.json"));
        assert!(matches!(result, Err(MappingError::Io { .. })));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = MappingRegistry::from_json_str("{\"entities\": [}");
        assert!(matches!(result, Err(MappingError::Parse { .. })));
    }

    #[test]
    fn test_malformed_mapping_rejected() {
        let json = r#"{"entities": {"Bad": {"table": "t--", "fields": {"a": "a"}}}}"#;
        let result = MappingRegistry::from_json_str(json);
        assert!(matches!(result, Err(MappingError::Malformed { .. })));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mapping = EntityMapping::new("orders").with_field("status", "status");
        let registry = MappingRegistry::new().with_entity("Order", mapping.clone()).unwrap();
        let result = registry.with_entity("Order", mapping);
        assert!(matches!(result, Err(MappingError::DuplicateEntity(name)) if name == "Order"));
    }
}
