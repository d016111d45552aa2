//! Schema-level upgrades: migrating a whole entity to the current version.
//!
//! An upgrade is either one transform, or a cascade of steps each targeting a
//! version. A cascade only runs the steps an entity still needs: those whose
//! target lies in `(entity version, schema version]`, in ascending order.

use crate::error::UpgradeError;
use serde_json::Value;
use shapeguard_types::SchemaVersion;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Versions an upgrade is moving an entity between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeContext {
    pub entity_type: String,
    pub from_version: SchemaVersion,
    pub to_version: SchemaVersion,
}

type UpgradeFn = Arc<dyn Fn(Value, &UpgradeContext) -> Result<Value, UpgradeError> + Send + Sync>;

/// One step of a cascade.
#[derive(Clone)]
pub struct UpgradeStep {
    to: SchemaVersion,
    run: UpgradeFn,
}

impl UpgradeStep {
    /// Creates a step migrating entities up to `to`.
    ///
    /// The step receives a context whose `from_version` is the version the
    /// entity is at when the step runs and whose `to_version` is `to`.
    pub fn new<F>(to: &str, run: F) -> Self
    where
        F: Fn(Value, &UpgradeContext) -> Result<Value, UpgradeError> + Send + Sync + 'static,
    {
        Self {
            to: SchemaVersion::parse(to),
            run: Arc::new(run),
        }
    }

    pub fn to(&self) -> SchemaVersion {
        self.to
    }
}

impl fmt::Debug for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeStep").field("to", &self.to).finish()
    }
}

/// How a schema migrates older entities.
#[derive(Clone)]
pub enum SchemaUpgrade {
    /// A single function, invoked once with the full version window.
    Transform(UpgradeFn),
    /// Ordered steps; see the module docs.
    Steps(Vec<UpgradeStep>),
}

impl SchemaUpgrade {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value, &UpgradeContext) -> Result<Value, UpgradeError> + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    pub fn steps(steps: impl IntoIterator<Item = UpgradeStep>) -> Self {
        Self::Steps(steps.into_iter().collect())
    }
}

impl fmt::Debug for SchemaUpgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(_) => f.write_str("Transform(..)"),
            Self::Steps(steps) => f.debug_tuple("Steps").field(steps).finish(),
        }
    }
}

fn step_failed(from: SchemaVersion, to: SchemaVersion) -> String {
    format!("Upgrade step from {from} to {to} failed")
}

fn or_default(err: UpgradeError, from: SchemaVersion, to: SchemaVersion) -> UpgradeError {
    if err.errors.is_empty() {
        UpgradeError::new(step_failed(from, to))
    } else {
        err
    }
}

/// Runs `upgrade` against `input`.
///
/// A cascade aborts at the first failing step; later steps never run.
pub fn apply_upgrade(
    upgrade: &SchemaUpgrade,
    input: Value,
    ctx: &UpgradeContext,
) -> Result<Value, UpgradeError> {
    match upgrade {
        SchemaUpgrade::Transform(run) => {
            debug!(
                entity_type = %ctx.entity_type,
                from = %ctx.from_version,
                to = %ctx.to_version,
                "applying upgrade transform"
            );
            run(input, ctx).map_err(|e| or_default(e, ctx.from_version, ctx.to_version))
        }
        SchemaUpgrade::Steps(steps) => {
            let mut ordered: Vec<&UpgradeStep> = steps.iter().collect();
            ordered.sort_by_key(|step| step.to);

            let mut from = ctx.from_version;
            let mut value = input;
            for step in ordered {
                if step.to <= from || step.to > ctx.to_version {
                    continue;
                }
                let step_ctx = UpgradeContext {
                    entity_type: ctx.entity_type.clone(),
                    from_version: from,
                    to_version: step.to,
                };
                value = (step.run)(value, &step_ctx).map_err(|e| or_default(e, from, step.to))?;
                debug!(
                    entity_type = %ctx.entity_type,
                    from = %from,
                    to = %step.to,
                    "applied upgrade step"
                );
                from = step.to;
            }
            Ok(value)
        }
    }
}
