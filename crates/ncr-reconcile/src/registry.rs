//! Process-wide schema registry.
//!
//! Populated once at startup, read-only afterwards. Schemas are handed out as
//! `Arc<Schema>` so concurrent reconciliations share them without locking.

use ncr_schemas::Schema;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateResourceType(pub String);

impl fmt::Display for DuplicateResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource type '{}' is already registered", self.0)
    }
}

impl std::error::Error for DuplicateResourceType {}

#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        resource_type: impl Into<String>,
        schema: Schema,
    ) -> Result<(), DuplicateResourceType> {
        let resource_type = resource_type.into();
        if self.schemas.contains_key(&resource_type) {
            return Err(DuplicateResourceType(resource_type));
        }
        self.schemas.insert(resource_type, Arc::new(schema));
        Ok(())
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<Schema>> {
        self.schemas.get(resource_type).cloned()
    }

    /// Registered resource types, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
