//! A shape bound to an entity type and version.

use crate::composition::{self, CompositionContext, EntityResolver};
use crate::config::{CompositionOptions, ValidationConfig};
use crate::error::{CompositionResult, SchemaResult, UpgradeError};
use crate::registry::SchemaRegistry;
use crate::upgrade::{apply_upgrade, SchemaUpgrade, UpgradeContext};
use crate::validate::{self, ValidationResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shapeguard_model::{
    describe_shape, pii_audit, DescribedField, FieldDescriptor, FieldValidator, PiiAuditEntry,
    Shape,
};
use shapeguard_pii::{FieldEncryptor, FieldHasher, Pseudonymizer};
use shapeguard_types::{EntityKey, SchemaVersion, TYPE_FIELD, VERSION_FIELD};
use tracing::debug;

/// A validated entity type.
///
/// Built once at startup and read-only afterwards; every operation works on
/// copies of its input, so a `Schema` can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    entity_type: String,
    version: SchemaVersion,
    shape: Shape,
    upgrade: Option<SchemaUpgrade>,
    validator: Option<FieldValidator>,
    config: ValidationConfig,
}

impl Schema {
    /// Creates a schema. The system fields `type` and `version` are placed
    /// ahead of the caller's fields; caller fields with those names are
    /// ignored.
    pub fn new(entity_type: impl Into<String>, version: &str, shape: Shape) -> Self {
        let entity_type = entity_type.into();
        let version = SchemaVersion::parse(version);

        let expected = entity_type.clone();
        let mut full = Shape::new()
            .with(
                TYPE_FIELD,
                FieldDescriptor::string()
                    .immutable()
                    .system()
                    .validate(move |v| v.as_str().is_none_or(|t| t == expected))
                    .describe("Entity type"),
            )
            .with(
                VERSION_FIELD,
                FieldDescriptor::string()
                    .immutable()
                    .system()
                    .validate(move |v| {
                        v.as_str()
                            .is_none_or(|s| SchemaVersion::parse(s) <= version)
                    })
                    .describe("Schema version the entity was written with"),
            );
        for (name, descriptor) in shape.iter() {
            if name != TYPE_FIELD && name != VERSION_FIELD {
                full.insert(name, descriptor.clone());
            }
        }

        Self {
            entity_type,
            version,
            shape: full,
            upgrade: None,
            validator: None,
            config: ValidationConfig::default(),
        }
    }

    /// Migrates entities whose version predates this schema.
    pub fn with_upgrade(mut self, upgrade: SchemaUpgrade) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    /// Whole-entity check, run only when every field passed.
    pub fn with_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(FieldValidator::new(f));
        self
    }

    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// The full shape, system fields first.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub(crate) fn upgrade_plan(&self) -> Option<&SchemaUpgrade> {
        self.upgrade.as_ref()
    }

    pub(crate) fn schema_validator(&self) -> Option<&FieldValidator> {
        self.validator.as_ref()
    }

    // ── Validation ───────────────────────────────────────────────

    /// Validates `input`, optionally against the currently stored version of
    /// the same entity for immutability checks.
    pub fn validate(&self, input: &Value, existing: Option<&Value>) -> ValidationResult {
        validate::validate_entity(self, input, existing)
    }

    /// Validates and reads the result into `T`.
    pub fn validate_as<T: DeserializeOwned>(
        &self,
        input: &Value,
        existing: Option<&Value>,
    ) -> SchemaResult<T> {
        self.validate(input, existing).into_typed()
    }

    // ── Upgrade ──────────────────────────────────────────────────

    /// Migrates `input` to this schema's version without validating fields.
    ///
    /// An entity already at or past the current version is returned with
    /// only `type` and `version` re-stamped.
    pub fn upgrade(&self, input: &Value) -> Result<Value, UpgradeError> {
        let Some(obj) = input.as_object() else {
            return Err(UpgradeError::new("Input must be an object"));
        };
        let from = validate::recorded_version(obj).unwrap_or_default();

        let mut upgraded = match &self.upgrade {
            Some(plan) if from.is_older_than(&self.version) => {
                let ctx = UpgradeContext {
                    entity_type: self.entity_type.clone(),
                    from_version: from,
                    to_version: self.version,
                };
                match apply_upgrade(plan, input.clone(), &ctx)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(UpgradeError::new(format!(
                            "Upgrade from {from} to {} did not produce an object",
                            self.version
                        )));
                    }
                }
            }
            _ => {
                debug!(entity_type = %self.entity_type, from = %from, "no upgrade needed");
                obj.clone()
            }
        };
        validate::restamp(&mut upgraded, self);
        Ok(Value::Object(upgraded))
    }

    // ── Composition ──────────────────────────────────────────────

    /// Checks that every reference in `entity` resolves to an entity of the
    /// declared type, following eager references through `registry`.
    pub async fn validate_composition(
        &self,
        entity: &Value,
        resolver: &dyn EntityResolver,
        registry: &SchemaRegistry,
        options: &CompositionOptions,
    ) -> CompositionResult<()> {
        let mut ctx = CompositionContext::new();
        self.validate_composition_with(entity, resolver, registry, options, &mut ctx)
            .await
    }

    /// Like [`Schema::validate_composition`], sharing a visited set with
    /// other walks.
    pub async fn validate_composition_with(
        &self,
        entity: &Value,
        resolver: &dyn EntityResolver,
        registry: &SchemaRegistry,
        options: &CompositionOptions,
        ctx: &mut CompositionContext,
    ) -> CompositionResult<()> {
        let walk = composition::Walk {
            resolver,
            registry,
            options,
        };
        walk.entity(
            self,
            entity,
            EntityKey::of_entity(entity),
            options.max_depth,
            true,
            ctx,
        )
        .await
    }

    // ── PII ──────────────────────────────────────────────────────

    pub fn prepare_for_storage(
        &self,
        entity: &Value,
        encryptor: &dyn FieldEncryptor,
        hasher: &dyn FieldHasher,
    ) -> SchemaResult<Value> {
        Ok(shapeguard_pii::prepare_for_storage(
            &self.shape,
            entity,
            encryptor,
            hasher,
        )?)
    }

    pub fn prepare_for_read(
        &self,
        stored: &Value,
        encryptor: &dyn FieldEncryptor,
    ) -> SchemaResult<Value> {
        Ok(shapeguard_pii::prepare_for_read(
            &self.shape,
            stored,
            encryptor,
        )?)
    }

    pub fn sanitize_for_log(
        &self,
        entity: &Value,
        pseudonymizer: Option<&dyn Pseudonymizer>,
    ) -> SchemaResult<Value> {
        Ok(shapeguard_pii::sanitize_for_log(
            &self.shape,
            entity,
            pseudonymizer,
        )?)
    }

    pub fn scrub_pii_for_delete(&self, stored: &Value) -> SchemaResult<Value> {
        Ok(shapeguard_pii::scrub_pii_for_delete(&self.shape, stored)?)
    }

    /// Every field with a PII classification, at any depth.
    pub fn pii_audit(&self) -> Vec<PiiAuditEntry> {
        pii_audit(&self.shape)
    }

    /// Documentation view of the full shape.
    pub fn describe(&self) -> Vec<DescribedField> {
        describe_shape(&self.shape)
    }
}
