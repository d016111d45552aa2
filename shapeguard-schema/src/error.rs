//! Error types for the schema layer.
//!
//! Validation failures are accumulated as strings inside a
//! [`ValidationResult`](crate::ValidationResult); the types here cover the
//! operations that fail as a whole.

use shapeguard_pii::PiiError;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for composition validation.
pub type CompositionResult<T> = Result<T, CompositionError>;

/// Errors from schema-level operations other than validation itself.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The entity failed validation.
    #[error("validation failed: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// The sanitized value could not be read into the requested type.
    #[error("typed view failed: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A configuration document could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A PII transform failed.
    #[error(transparent)]
    Pii(#[from] PiiError),
}

/// A failed schema-level upgrade.
///
/// Returned as a value, never logged and swallowed: callers decide whether
/// an entity is un-migratable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upgrade failed: {}", errors.join("; "))]
pub struct UpgradeError {
    pub errors: Vec<String>,
}

impl UpgradeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    /// An error carrying no message; the engine substitutes one naming the
    /// failing step.
    pub fn unspecified() -> Self {
        Self { errors: Vec::new() }
    }
}

/// Referential integrity failures found while walking an entity graph.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// The resolver found nothing for a reference.
    #[error("Broken reference: {ref_type} {id} in field {field}")]
    BrokenReference {
        ref_type: String,
        id: String,
        field: String,
    },

    /// A reference, or the entity it resolved to, has the wrong type.
    #[error("Reference type mismatch for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// The field value is not a `{type, id}` reference.
    #[error("Field {field} is not a valid reference")]
    InvalidReference { field: String },

    /// The injected resolver failed.
    #[error("resolver error: {0}")]
    Resolver(String),
}
