//! Core type definitions for shapeguard.
//!
//! This crate defines the small, schema-agnostic values shared by every other
//! shapeguard crate:
//! - [`SchemaVersion`]: the major.minor.patch triple used for version gating
//! - [`EntityRef`] and [`EntityKey`]: weak `{type, id}` references and their identity
//! - the names of the two system fields every entity carries

mod reference;
mod version;

pub use reference::{EntityKey, EntityRef};
pub use version::SchemaVersion;

/// Name of the system field holding an entity's type.
pub const TYPE_FIELD: &str = "type";

/// Name of the system field holding an entity's schema version.
pub const VERSION_FIELD: &str = "version";

/// Version assigned to a field when none is declared.
pub const DEFAULT_FIELD_VERSION: &str = "1.0.0";
