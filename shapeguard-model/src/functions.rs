//! Caller-supplied functions attached to field descriptors.
//!
//! Each wrapper holds an `Arc` so descriptors stay cheap to clone and can be
//! shared across threads once a schema is built.

use serde_json::Value;
use shapeguard_types::SchemaVersion;
use std::fmt;
use std::sync::Arc;

/// A predicate over a field value. Several validators on one field are ANDed.
#[derive(Clone)]
pub struct FieldValidator(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl FieldValidator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the predicate.
    pub fn check(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldValidator(..)")
    }
}

/// Default applied when a field's value is absent or null.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned on every use.
    Value(Value),
    /// A zero-argument producer, called on every use.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Context handed to a field upgrader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpgradeContext {
    /// Version recorded on the entity being validated.
    pub entity_from_version: SchemaVersion,
    /// Current version of the schema.
    pub entity_to_version: SchemaVersion,
    /// Version tag of the field's current shape.
    pub field_to_version: SchemaVersion,
    /// Path of the field being repaired.
    pub field_name: String,
}

/// Single-field repair step, tried once when a field fails validation on an
/// entity older than its schema.
///
/// Returns the replacement value, or an error message that is reported in
/// place of the field's original errors.
#[derive(Clone)]
pub struct FieldUpgrader(
    Arc<dyn Fn(&Value, &FieldUpgradeContext) -> Result<Value, String> + Send + Sync>,
);

impl FieldUpgrader {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &FieldUpgradeContext) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the upgrader against the field's pre-upgrade value.
    pub fn apply(&self, value: &Value, ctx: &FieldUpgradeContext) -> Result<Value, String> {
        (self.0)(value, ctx)
    }
}

impl fmt::Debug for FieldUpgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldUpgrader(..)")
    }
}
