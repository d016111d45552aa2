//! Weak references between entities.

use crate::TYPE_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A `{type, id}` pointer to another entity.
///
/// References never own their target; resolution always goes through a
/// caller-supplied resolver and may legitimately fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
}

impl EntityRef {
    /// Creates a reference.
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Reads a reference out of a JSON value.
    ///
    /// Returns `None` unless the value is an object whose `type` and `id`
    /// are both strings. Extra keys (rich references) are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let entity_type = obj.get(TYPE_FIELD)?.as_str()?;
        let id = obj.get("id")?.as_str()?;
        Some(Self::new(entity_type, id))
    }

    /// Returns the identity key used for cycle detection.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.entity_type, &self.id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity_type, self.id)
    }
}

/// `type:id` identity of an entity within a reference graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    /// Builds the key for an entity type and id.
    pub fn new(entity_type: &str, id: &str) -> Self {
        Self(format!("{entity_type}:{id}"))
    }

    /// Builds the key from an entity value, if it carries string `type` and `id`.
    pub fn of_entity(entity: &Value) -> Option<Self> {
        EntityRef::from_value(entity).map(|r| r.key())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
