use serde::{Deserialize, Serialize};

/// Sensitivity tier of a field's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiClassification {
    #[default]
    None,
    Low,
    High,
}

/// Protective transform applied when an entity is prepared for storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiAction {
    #[default]
    None,
    /// Stored as `<name>Encrypted`, recoverable on read.
    Encrypt,
    /// Stored as `<name>Hash`, not recoverable.
    Hash,
    /// Nulled in place.
    Clear,
}

/// How a field appears in log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogHandling {
    #[default]
    Plain,
    /// Replaced with `"[REDACTED]"`.
    Redact,
    /// Replaced with a caller-supplied pseudonym.
    Pseudonym,
    /// Dropped from the output entirely.
    Omit,
}

/// PII declaration for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiPolicy {
    pub classification: PiiClassification,
    pub action: PiiAction,
    pub log_handling: LogHandling,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl PiiPolicy {
    /// Shorthand for a high-sensitivity field with the given storage action.
    pub fn high(action: PiiAction) -> Self {
        Self {
            classification: PiiClassification::High,
            action,
            log_handling: LogHandling::Redact,
            purpose: None,
        }
    }

    /// Shorthand for a low-sensitivity field with the given storage action.
    pub fn low(action: PiiAction) -> Self {
        Self {
            classification: PiiClassification::Low,
            action,
            log_handling: LogHandling::Plain,
            purpose: None,
        }
    }

    /// Overrides the log handling.
    pub fn with_log_handling(mut self, log_handling: LogHandling) -> Self {
        self.log_handling = log_handling;
        self
    }

    /// Records why the data is collected.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Whether the field carries any PII classification.
    pub fn is_sensitive(&self) -> bool {
        self.classification != PiiClassification::None
    }
}
