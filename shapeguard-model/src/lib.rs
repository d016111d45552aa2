//! Entity shape model for shapeguard.
//!
//! Defines the declarative types every other shapeguard subsystem consumes:
//! - [`FieldDescriptor`]: one field's type, constraints, PII policy and upgrader
//! - [`FieldType`]: the tagged union over field kinds, carrying nested shapes
//! - [`Shape`]: an insertion-ordered map from field name to descriptor
//! - [`PiiPolicy`]: sensitivity tier, storage action and log handling of a field
//! - [`describe_shape`] / [`pii_audit`]: documentation views for admin tooling
//!
//! Shapes are built once at startup and only read afterwards. Nothing in this
//! crate validates data; see `shapeguard-schema` for the engine.

mod describe;
mod field;
mod functions;
mod pii;
mod shape;

pub use describe::{describe_shape, pii_audit, DescribedField, FieldDescription, PiiAuditEntry};
pub use field::{Deprecation, FieldDescriptor, FieldType, RefPolicy};
pub use functions::{DefaultValue, FieldUpgradeContext, FieldUpgrader, FieldValidator};
pub use pii::{LogHandling, PiiAction, PiiClassification, PiiPolicy};
pub use shape::Shape;
