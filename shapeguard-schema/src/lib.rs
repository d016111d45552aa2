//! Schema engine for shapeguard.
//!
//! A [`Schema`] binds a [`Shape`](shapeguard_model::Shape) to an entity type
//! and version, and exposes:
//! - [`Schema::validate`]: accumulate-and-report validation into a sanitized value
//! - [`Schema::upgrade`]: schema-level migration of older entities
//! - [`Schema::validate_composition`]: async referential integrity checks
//! - PII pass-throughs to `shapeguard-pii`
//!
//! [`SchemaRegistry`] maps entity types to schemas for composition walks.

mod composition;
mod config;
mod error;
mod registry;
mod schema;
mod upgrade;
mod validate;

pub use composition::{CompositionContext, EntityResolver};
pub use config::{CompositionOptions, PiiEnforcement, ValidationConfig};
pub use error::{CompositionError, CompositionResult, SchemaError, SchemaResult, UpgradeError};
pub use registry::SchemaRegistry;
pub use schema::Schema;
pub use upgrade::{apply_upgrade, SchemaUpgrade, UpgradeContext, UpgradeStep};
pub use validate::ValidationResult;
