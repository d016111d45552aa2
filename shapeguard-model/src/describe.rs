//! Documentation views over a shape, for admin and UI tooling.

use crate::field::{FieldDescriptor, FieldType};
use crate::pii::{LogHandling, PiiAction, PiiClassification, PiiPolicy};
use crate::shape::Shape;
use serde::Serialize;
use serde_json::Value;

/// Documentation record for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    #[serde(rename = "type")]
    pub field_type: String,
    pub optional: bool,
    pub immutable: bool,
    pub system: bool,
    pub description: Option<String>,
    pub version: String,
    pub deprecated: bool,
    pub deprecated_version: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    pub ref_type: Option<String>,
    pub pii: PiiPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<DescribedField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDescription>>,
}

/// A field description paired with its name, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribedField {
    pub name: String,
    #[serde(flatten)]
    pub description: FieldDescription,
}

/// Describes every field of a shape, recursing into nested shapes.
pub fn describe_shape(shape: &Shape) -> Vec<DescribedField> {
    shape
        .iter()
        .map(|(name, descriptor)| DescribedField {
            name: name.to_string(),
            description: describe_field(descriptor),
        })
        .collect()
}

fn describe_field(descriptor: &FieldDescriptor) -> FieldDescription {
    let field_type = descriptor.field_type();
    let deprecation = descriptor.deprecation();
    FieldDescription {
        field_type: field_type.type_name().to_string(),
        optional: !descriptor.is_required(),
        immutable: descriptor.is_immutable(),
        system: descriptor.is_system(),
        description: descriptor.description().map(str::to_string),
        version: descriptor.field_version().to_string(),
        deprecated: deprecation.is_some(),
        deprecated_version: deprecation.and_then(|d| d.since).map(|v| v.to_string()),
        enum_values: descriptor.enum_values().map(<[Value]>::to_vec),
        ref_type: field_type.ref_type().map(str::to_string),
        pii: descriptor.pii_policy().clone(),
        fields: field_type.child_shape().map(describe_shape),
        items: field_type.item().map(|item| Box::new(describe_field(item))),
    }
}

/// One sensitive field found by [`pii_audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiAuditEntry {
    /// Dotted path; array items appear as `name[]`.
    pub path: String,
    pub classification: PiiClassification,
    pub action: PiiAction,
    pub log_handling: LogHandling,
    pub purpose: Option<String>,
}

/// Lists every field with a PII classification, at any depth.
pub fn pii_audit(shape: &Shape) -> Vec<PiiAuditEntry> {
    let mut entries = Vec::new();
    audit_shape(shape, "", &mut entries);
    entries
}

fn audit_shape(shape: &Shape, prefix: &str, entries: &mut Vec<PiiAuditEntry>) {
    for (name, descriptor) in shape.iter() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        audit_field(descriptor, path, entries);
    }
}

fn audit_field(descriptor: &FieldDescriptor, path: String, entries: &mut Vec<PiiAuditEntry>) {
    let policy = descriptor.pii_policy();
    if policy.is_sensitive() {
        entries.push(PiiAuditEntry {
            path: path.clone(),
            classification: policy.classification,
            action: policy.action,
            log_handling: policy.log_handling,
            purpose: policy.purpose.clone(),
        });
    }
    match descriptor.field_type() {
        FieldType::Array { item } => audit_field(item, format!("{path}[]"), entries),
        other => {
            if let Some(child) = other.child_shape() {
                audit_shape(child, &path, entries);
            }
        }
    }
}
