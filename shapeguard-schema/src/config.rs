//! Validation and composition settings.

use crate::error::SchemaResult;
use serde::{Deserialize, Serialize};

/// How an empty, required, high-PII field is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiEnforcement {
    /// Reject the field.
    Strict,
    /// Log a warning and keep validating.
    #[default]
    Warn,
    /// Ignore.
    None,
}

/// Per-schema validation settings.
///
/// ```toml
/// pii_enforcement = "strict"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub pii_enforcement: PiiEnforcement,
}

impl ValidationConfig {
    /// Parses settings from a TOML document. Missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> SchemaResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn with_pii_enforcement(mut self, mode: PiiEnforcement) -> Self {
        self.pii_enforcement = mode;
        self
    }
}

fn default_max_depth() -> usize {
    5
}

fn default_auto_validate() -> bool {
    true
}

/// Options for [`Schema::validate_composition`](crate::Schema::validate_composition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionOptions {
    /// Reference hops followed before the walk stops recursing.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Recurse into eager references with the target's registered schema.
    #[serde(default = "default_auto_validate")]
    pub auto_validate: bool,
    /// Restrict the root entity's checks to these fields.
    #[serde(default)]
    pub only_fields: Option<Vec<String>>,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            auto_validate: default_auto_validate(),
            only_fields: None,
        }
    }
}

impl CompositionOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn without_auto_validate(mut self) -> Self {
        self.auto_validate = false;
        self
    }

    pub fn only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn includes(&self, field: &str) -> bool {
        self.only_fields
            .as_ref()
            .is_none_or(|fields| fields.iter().any(|f| f == field))
    }
}
