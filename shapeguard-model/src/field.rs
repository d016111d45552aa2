//! Field descriptors: the atomic declaration of one field.

use crate::functions::{DefaultValue, FieldUpgradeContext, FieldUpgrader, FieldValidator};
use crate::pii::PiiPolicy;
use crate::shape::Shape;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shapeguard_types::SchemaVersion;
use std::sync::Arc;

/// The kind of a field, with the nested structure each kind carries.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Nested object with its own shape.
    Object { shape: Shape },
    /// Homogeneous array; every element is described by `item`.
    Array { item: Box<FieldDescriptor> },
    /// `{type, id}` reference. `shape` describes extra co-located fields
    /// of a rich reference.
    Ref {
        ref_type: Option<String>,
        shape: Option<Shape>,
    },
}

impl FieldType {
    /// Returns the type name used in error messages and describe output.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
            FieldType::Ref { .. } => "ref",
        }
    }

    /// Nested shape of an object or rich reference.
    pub fn child_shape(&self) -> Option<&Shape> {
        match self {
            FieldType::Object { shape } => Some(shape),
            FieldType::Ref { shape, .. } => shape.as_ref(),
            _ => None,
        }
    }

    /// Item descriptor of an array.
    pub fn item(&self) -> Option<&FieldDescriptor> {
        match self {
            FieldType::Array { item } => Some(item),
            _ => None,
        }
    }

    /// Declared target type of a reference.
    pub fn ref_type(&self) -> Option<&str> {
        match self {
            FieldType::Ref { ref_type, .. } => ref_type.as_deref(),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Number | FieldType::Boolean)
    }
}

/// Whether composition validation follows a reference past its first hop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefPolicy {
    /// Resolve and recursively validate the target.
    #[default]
    Eager,
    /// Resolve only; never recurse.
    Lazy,
}

/// Deprecation marker for documentation output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub since: Option<SchemaVersion>,
}

/// Declaration of a single field.
///
/// The kind is fixed at construction; everything else is set through the
/// consuming builder methods.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    field_type: FieldType,
    required: bool,
    immutable: bool,
    system: bool,
    validators: Vec<FieldValidator>,
    enum_values: Option<Vec<Value>>,
    pii: PiiPolicy,
    default: Option<DefaultValue>,
    field_version: SchemaVersion,
    upgrader: Option<FieldUpgrader>,
    ref_policy: RefPolicy,
    description: Option<String>,
    deprecation: Option<Deprecation>,
}

impl FieldDescriptor {
    /// Creates a required descriptor of the given kind.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            immutable: false,
            system: false,
            validators: Vec::new(),
            enum_values: None,
            pii: PiiPolicy::default(),
            default: None,
            field_version: SchemaVersion::parse(shapeguard_types::DEFAULT_FIELD_VERSION),
            upgrader: None,
            ref_policy: RefPolicy::default(),
            description: None,
            deprecation: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn object(shape: Shape) -> Self {
        Self::new(FieldType::Object { shape })
    }

    pub fn array(item: FieldDescriptor) -> Self {
        Self::new(FieldType::Array {
            item: Box::new(item),
        })
    }

    /// Reference that must point at `ref_type`.
    pub fn reference(ref_type: impl Into<String>) -> Self {
        Self::new(FieldType::Ref {
            ref_type: Some(ref_type.into()),
            shape: None,
        })
    }

    /// Reference to any entity type.
    pub fn any_reference() -> Self {
        Self::new(FieldType::Ref {
            ref_type: None,
            shape: None,
        })
    }

    /// Reference carrying extra fields next to `{type, id}`.
    pub fn rich_reference(ref_type: impl Into<String>, shape: Shape) -> Self {
        Self::new(FieldType::Ref {
            ref_type: Some(ref_type.into()),
            shape: Some(shape),
        })
    }

    // ── Modifiers ────────────────────────────────────────────────

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the field required. Has no effect once a default is set.
    pub fn required(mut self) -> Self {
        self.required = self.default.is_none();
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Marks the field as framework-managed.
    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    /// Sets a fixed default. The field becomes optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self.required = false;
        self
    }

    /// Sets a default producer. The field becomes optional.
    pub fn with_default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(f)));
        self.required = false;
        self
    }

    /// Adds a custom predicate, ANDed with any existing ones.
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validators.push(FieldValidator::new(f));
        self
    }

    /// Lower bound: numeric value, or character/element count.
    pub fn min(self, min: f64) -> Self {
        self.validate(move |v| measure(v).is_none_or(|m| m >= min))
    }

    /// Upper bound: numeric value, or character/element count.
    pub fn max(self, max: f64) -> Self {
        self.validate(move |v| measure(v).is_none_or(|m| m <= max))
    }

    /// Requires string values to match `pattern`.
    pub fn pattern(self, pattern: Regex) -> Self {
        self.validate(move |v| v.as_str().is_none_or(|s| pattern.is_match(s)))
    }

    /// Restricts string or number values to a closed set.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn pii(mut self, policy: PiiPolicy) -> Self {
        self.pii = policy;
        self
    }

    /// Tags the version in which this field's shape was introduced or changed.
    pub fn since(mut self, version: &str) -> Self {
        self.field_version = SchemaVersion::parse(version);
        self
    }

    /// Attaches a repair step for values written by older schema versions.
    pub fn upgrade<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &FieldUpgradeContext) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.upgrader = Some(FieldUpgrader::new(f));
        self
    }

    /// Stops composition validation at the first hop of this reference.
    pub fn lazy(mut self) -> Self {
        self.ref_policy = RefPolicy::Lazy;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, since: Option<&str>) -> Self {
        self.deprecation = Some(Deprecation {
            since: since.map(SchemaVersion::parse),
        });
        self
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn validators(&self) -> &[FieldValidator] {
        &self.validators
    }

    /// Runs every validator; true when all pass or none are set.
    pub fn run_validators(&self, value: &Value) -> bool {
        self.validators.iter().all(|v| v.check(value))
    }

    pub fn has_validators(&self) -> bool {
        !self.validators.is_empty()
    }

    pub fn enum_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref()
    }

    pub fn pii_policy(&self) -> &PiiPolicy {
        &self.pii
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn field_version(&self) -> SchemaVersion {
        self.field_version
    }

    pub fn upgrader(&self) -> Option<&FieldUpgrader> {
        self.upgrader.as_ref()
    }

    pub fn ref_policy(&self) -> RefPolicy {
        self.ref_policy
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deprecation(&self) -> Option<&Deprecation> {
        self.deprecation.as_ref()
    }
}

/// Magnitude compared by `min`/`max`; `None` for kinds they do not apply to.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        _ => None,
    }
}
