//! The validation engine.
//!
//! Validation works on a copy of the input and never fails as a whole except
//! for a non-object input or a failed schema-level upgrade. Every other
//! problem is accumulated as an error string and every field is visited.
//!
//! Per top-level field the checks run in this order:
//!
//! 1. default, when the value is absent or null
//! 2. required (short-circuits the field)
//! 3. immutability against the existing entity (short-circuits)
//! 4. high-PII emptiness, per [`PiiEnforcement`] (short-circuits when strict)
//! 5. custom validators (short-circuit type checks)
//! 6. type shape, recursing into objects, arrays and references
//! 7. one field-upgrade retry if 5 or 6 failed on an outdated entity
//!
//! Nested fields run 1, 2, 5 and 6 only.

use crate::config::PiiEnforcement;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::upgrade::{apply_upgrade, UpgradeContext};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shapeguard_model::{FieldDescriptor, FieldType, FieldUpgradeContext, PiiClassification, Shape};
use shapeguard_types::{EntityRef, SchemaVersion, TYPE_FIELD, VERSION_FIELD};
use tracing::warn;

const INPUT_NOT_OBJECT: &str = "Input must be an object";
const SCHEMA_LEVEL_FAILED: &str = "Schema-level validation failed.";

/// Outcome of [`Schema::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Sanitized entity. Present even when invalid, so callers can inspect
    /// partial results; absent only when validation could not start.
    pub value: Option<Value>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn rejected(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            value: None,
            errors,
        }
    }

    /// Reads the sanitized value into a caller-defined type.
    pub fn into_typed<T: DeserializeOwned>(self) -> SchemaResult<T> {
        if !self.valid {
            return Err(SchemaError::Invalid {
                errors: self.errors,
            });
        }
        Ok(serde_json::from_value(self.value.unwrap_or(Value::Null))?)
    }
}

pub(crate) fn validate_entity(
    schema: &Schema,
    input: &Value,
    existing: Option<&Value>,
) -> ValidationResult {
    let Some(obj) = input.as_object() else {
        return ValidationResult::rejected(vec![INPUT_NOT_OBJECT.to_string()]);
    };

    let mut working = obj.clone();
    stamp_missing(&mut working, schema);
    let recorded = recorded_version(&working);

    if let (Some(upgrade), Some(from)) = (schema.upgrade_plan(), recorded) {
        if from.is_older_than(&schema.version()) {
            let ctx = UpgradeContext {
                entity_type: schema.entity_type().to_string(),
                from_version: from,
                to_version: schema.version(),
            };
            match apply_upgrade(upgrade, Value::Object(working), &ctx) {
                Ok(Value::Object(upgraded)) => {
                    working = upgraded;
                    restamp(&mut working, schema);
                }
                Ok(_) => {
                    return ValidationResult::rejected(vec![format!(
                        "Upgrade from {from} to {} did not produce an object",
                        schema.version()
                    )]);
                }
                Err(e) => return ValidationResult::rejected(e.errors),
            }
        }
    }

    let mut pass = TopLevelPass {
        schema,
        recorded,
        existing: existing.and_then(Value::as_object),
        errors: Vec::new(),
    };
    let mut out = Map::new();
    for (name, descriptor) in schema.shape().iter() {
        pass.field(name, descriptor, &working, &mut out);
    }

    let mut errors = pass.errors;
    let value = Value::Object(out);
    if errors.is_empty() {
        if let Some(validator) = schema.schema_validator() {
            if !validator.check(&value) {
                errors.push(SCHEMA_LEVEL_FAILED.to_string());
            }
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        value: Some(value),
        errors,
    }
}

/// Fills `type` and `version` when the caller left them out.
fn stamp_missing(entity: &mut Map<String, Value>, schema: &Schema) {
    for (key, value) in system_values(schema) {
        if entity.get(key).is_none_or(Value::is_null) {
            entity.insert(key.to_string(), value);
        }
    }
}

/// Overwrites `type` and `version` with the canonical values.
pub(crate) fn restamp(entity: &mut Map<String, Value>, schema: &Schema) {
    for (key, value) in system_values(schema) {
        entity.insert(key.to_string(), value);
    }
}

fn system_values(schema: &Schema) -> [(&'static str, Value); 2] {
    [
        (TYPE_FIELD, Value::String(schema.entity_type().to_string())),
        (VERSION_FIELD, Value::String(schema.version().to_string())),
    ]
}

pub(crate) fn recorded_version(entity: &Map<String, Value>) -> Option<SchemaVersion> {
    entity
        .get(VERSION_FIELD)
        .and_then(Value::as_str)
        .map(SchemaVersion::parse)
}

struct TopLevelPass<'a> {
    schema: &'a Schema,
    recorded: Option<SchemaVersion>,
    existing: Option<&'a Map<String, Value>>,
    errors: Vec<String>,
}

impl TopLevelPass<'_> {
    fn field(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) {
        let value = match with_default(descriptor, source.get(name)) {
            Some(v) if !v.is_null() => v,
            other => {
                if descriptor.is_required() {
                    self.errors.push(missing(name));
                } else if let Some(null) = other {
                    out.insert(name.to_string(), null);
                }
                return;
            }
        };

        // The upgrade engine owns the system fields, so they are exempt.
        if descriptor.is_immutable() && !descriptor.is_system() {
            if let Some(previous) = self.existing.and_then(|e| e.get(name)) {
                if !values_equal(previous, &value) {
                    self.errors.push(format!("Field is immutable: {name}"));
                    out.insert(name.to_string(), value);
                    return;
                }
            }
        }

        if descriptor.pii_policy().classification == PiiClassification::High
            && descriptor.is_required()
            && is_empty(&value)
        {
            match self.schema.config().pii_enforcement {
                PiiEnforcement::Strict => {
                    self.errors
                        .push(format!("High PII field must not be empty: {name}"));
                    out.insert(name.to_string(), value);
                    return;
                }
                PiiEnforcement::Warn => warn!(
                    entity_type = %self.schema.entity_type(),
                    field = %name,
                    "high PII field is empty"
                ),
                PiiEnforcement::None => {}
            }
        }

        let (checked, field_errors) = check_field(descriptor, &value, name);
        if field_errors.is_empty() {
            out.insert(name.to_string(), checked);
            return;
        }

        match (descriptor.upgrader(), self.recorded) {
            (Some(upgrader), Some(from)) if from.is_older_than(&self.schema.version()) => {
                let ctx = FieldUpgradeContext {
                    entity_from_version: from,
                    entity_to_version: self.schema.version(),
                    field_to_version: descriptor.field_version(),
                    field_name: name.to_string(),
                };
                match upgrader.apply(&value, &ctx) {
                    Ok(upgraded) => {
                        let (rechecked, retry_errors) = check_field(descriptor, &upgraded, name);
                        self.errors.extend(retry_errors);
                        out.insert(name.to_string(), rechecked);
                    }
                    Err(message) if message.is_empty() => {
                        self.errors
                            .push(format!("Field upgrade failed for field: {name}"));
                        out.insert(name.to_string(), value);
                    }
                    Err(message) => {
                        self.errors.push(message);
                        out.insert(name.to_string(), value);
                    }
                }
            }
            _ => {
                self.errors.extend(field_errors);
                out.insert(name.to_string(), checked);
            }
        }
    }
}

fn with_default(descriptor: &FieldDescriptor, raw: Option<&Value>) -> Option<Value> {
    match (raw, descriptor.default_value()) {
        (None | Some(Value::Null), Some(default)) => Some(default.produce()),
        (raw, _) => raw.cloned(),
    }
}

/// Deep equality where numbers compare as `f64`, so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn is_member(allowed: &[Value], value: &Value) -> bool {
    allowed.iter().any(|candidate| values_equal(candidate, value))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn missing(path: &str) -> String {
    format!("Missing required field: {path}")
}

fn invalid(path: &str) -> String {
    format!("Invalid value for field: {path}")
}

fn must_be(path: &str, type_name: &str) -> String {
    format!("Field {path} must be {type_name}")
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values.into_iter().map(display).collect::<Vec<_>>().join(", ")
}

/// Custom validators, then type shape. Returns the sanitized value.
fn check_field(descriptor: &FieldDescriptor, value: &Value, path: &str) -> (Value, Vec<String>) {
    let mut errors = Vec::new();
    if !descriptor.run_validators(value) {
        errors.push(invalid(path));
        return (value.clone(), errors);
    }
    let checked = validate_by_type(descriptor, value, path, &mut errors);
    (checked, errors)
}

fn matches_primitive(field_type: &FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        _ => false,
    }
}

fn validate_by_type(
    descriptor: &FieldDescriptor,
    value: &Value,
    path: &str,
    errors: &mut Vec<String>,
) -> Value {
    let field_type = descriptor.field_type();
    match field_type {
        FieldType::String | FieldType::Number | FieldType::Boolean => {
            if !matches_primitive(field_type, value) {
                errors.push(must_be(path, field_type.type_name()));
            } else if let Some(allowed) = descriptor.enum_values() {
                if !is_member(allowed, value) {
                    errors.push(format!("Field {path} must be one of: {}", list(allowed)));
                }
            }
            value.clone()
        }
        FieldType::Object { shape } => match value.as_object() {
            Some(obj) => Value::Object(validate_nested(shape, obj, path, errors)),
            None => {
                errors.push(must_be(path, "object"));
                value.clone()
            }
        },
        FieldType::Array { item } => match value.as_array() {
            Some(elements) => validate_array(descriptor, item, elements, path, errors),
            None => {
                errors.push(must_be(path, "array"));
                value.clone()
            }
        },
        FieldType::Ref { ref_type, shape } => {
            validate_ref(ref_type.as_deref(), shape.as_ref(), value, path, errors)
        }
    }
}

fn validate_nested(
    shape: &Shape,
    source: &Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<String>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, descriptor) in shape.iter() {
        let path = format!("{prefix}.{name}");
        let value = match with_default(descriptor, source.get(name)) {
            Some(v) if !v.is_null() => v,
            other => {
                if descriptor.is_required() {
                    errors.push(missing(&path));
                } else if let Some(null) = other {
                    out.insert(name.to_string(), null);
                }
                continue;
            }
        };
        let (checked, field_errors) = check_field(descriptor, &value, &path);
        errors.extend(field_errors);
        out.insert(name.to_string(), checked);
    }
    out
}

/// Validates array elements against `item`.
///
/// Item descriptors are primitives, objects or references; a nested array is
/// the only kind that reaches the unsupported arm.
fn validate_array(
    descriptor: &FieldDescriptor,
    item: &FieldDescriptor,
    elements: &[Value],
    path: &str,
    errors: &mut Vec<String>,
) -> Value {
    let item_type = item.field_type();
    match item_type {
        FieldType::String | FieldType::Number | FieldType::Boolean => {
            let allowed = item.enum_values().or(descriptor.enum_values());
            let mut offending = Vec::new();
            for (i, element) in elements.iter().enumerate() {
                if !matches_primitive(item_type, element) {
                    errors.push(must_be(&format!("{path}[{i}]"), item_type.type_name()));
                } else if !item.run_validators(element) {
                    errors.push(invalid(&format!("{path}[{i}]")));
                } else if allowed.is_some_and(|allowed| !is_member(allowed, element)) {
                    offending.push(element);
                }
            }
            if let Some(allowed) = allowed {
                if !offending.is_empty() {
                    errors.push(format!(
                        "Field {path} contains invalid values: {}. Allowed: {}",
                        list(offending),
                        list(allowed)
                    ));
                }
            }
            Value::Array(elements.to_vec())
        }
        FieldType::Object { .. } | FieldType::Ref { .. } => Value::Array(
            elements
                .iter()
                .enumerate()
                .map(|(i, element)| {
                    let (checked, item_errors) =
                        check_field(item, element, &format!("{path}[{i}]"));
                    errors.extend(item_errors);
                    checked
                })
                .collect(),
        ),
        FieldType::Array { .. } => {
            errors.push(format!(
                "Field {path} has unsupported array item type: {}",
                item_type.type_name()
            ));
            Value::Array(elements.to_vec())
        }
    }
}

fn validate_ref(
    ref_type: Option<&str>,
    shape: Option<&Shape>,
    value: &Value,
    path: &str,
    errors: &mut Vec<String>,
) -> Value {
    let Some(reference) = EntityRef::from_value(value) else {
        errors.push(format!("Field {path} must be {{ type: string; id: string }}"));
        return value.clone();
    };
    if let Some(expected) = ref_type {
        if reference.entity_type != expected {
            errors.push(format!(
                "Field {path} must reference {expected}, got {}",
                reference.entity_type
            ));
        }
    }
    match (shape, value.as_object()) {
        (Some(shape), Some(obj)) => {
            let mut out = Map::new();
            out.insert(TYPE_FIELD.to_string(), Value::String(reference.entity_type));
            out.insert("id".to_string(), Value::String(reference.id));
            out.extend(validate_nested(shape, obj, path, errors));
            Value::Object(out)
        }
        _ => value.clone(),
    }
}
