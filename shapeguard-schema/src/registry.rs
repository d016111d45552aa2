//! Schema lookup by entity type.

use crate::schema::Schema;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Holds one schema per entity type.
///
/// Registration is expected at startup; lookups may run concurrently from
/// any thread. Several independent registries can coexist.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` under its entity type. The last registration wins;
    /// the replaced schema, if any, is returned.
    pub fn register(&self, schema: Schema) -> Option<Arc<Schema>> {
        let entity_type = schema.entity_type().to_string();
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        let previous = schemas.insert(entity_type.clone(), Arc::new(schema));
        debug!(
            entity_type = %entity_type,
            replaced = previous.is_some(),
            "registered schema"
        );
        previous
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<Schema>> {
        self.read().get(entity_type).cloned()
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.read().contains_key(entity_type)
    }

    /// Registered entity types, sorted.
    pub fn entity_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// A point-in-time copy of every registration.
    pub fn snapshot(&self) -> HashMap<String, Arc<Schema>> {
        self.read().clone()
    }

    pub fn clear(&self) {
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Schema>>> {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner)
    }
}
