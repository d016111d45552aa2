//! Referential integrity across an entity graph.
//!
//! Unlike field validation, the walk stops at the first failure and returns
//! it as an `Err`. References are resolved one at a time through the
//! caller's [`EntityResolver`]; a shared visited set breaks cycles and
//! `max_depth` bounds long chains, whichever comes first.

use crate::config::CompositionOptions;
use crate::error::{CompositionError, CompositionResult};
use crate::registry::SchemaRegistry;
use crate::schema::Schema;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use shapeguard_model::{FieldDescriptor, FieldType, RefPolicy};
use shapeguard_types::{EntityKey, TYPE_FIELD};
use std::collections::HashSet;
use tracing::debug;

/// Looks up entities by type and id.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Returns `None` when no such entity exists.
    async fn resolve_entity(&self, entity_type: &str, id: &str)
        -> CompositionResult<Option<Value>>;
}

/// Entities already walked during one composition check.
#[derive(Debug, Default)]
pub struct CompositionContext {
    visited: HashSet<EntityKey>,
}

impl CompositionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` visited. Returns false if it already was.
    pub fn mark(&mut self, key: EntityKey) -> bool {
        self.visited.insert(key)
    }

    pub fn is_visited(&self, key: &EntityKey) -> bool {
        self.visited.contains(key)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

pub(crate) struct Walk<'a> {
    pub(crate) resolver: &'a dyn EntityResolver,
    pub(crate) registry: &'a SchemaRegistry,
    pub(crate) options: &'a CompositionOptions,
}

/// Mirrors the usual notion of an absent value: null, false, 0 and "".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn is_lazy(descriptor: &FieldDescriptor) -> bool {
    descriptor.ref_policy() == RefPolicy::Lazy
}

impl<'a> Walk<'a> {
    pub(crate) fn entity<'b>(
        &'b self,
        schema: &'b Schema,
        entity: &'b Value,
        key: Option<EntityKey>,
        depth: usize,
        root: bool,
        ctx: &'b mut CompositionContext,
    ) -> BoxFuture<'b, CompositionResult<()>>
    where
        'a: 'b,
    {
        async move {
            if let Some(key) = key {
                if !ctx.mark(key) {
                    return Ok(());
                }
            }

            for (name, descriptor) in schema.shape().iter() {
                if root && !self.options.includes(name) {
                    continue;
                }
                let Some(value) = entity.get(name).filter(|v| !is_falsy(v)) else {
                    continue;
                };
                match descriptor.field_type() {
                    FieldType::Ref { ref_type, .. } => {
                        self.reference(
                            name,
                            ref_type.as_deref(),
                            is_lazy(descriptor),
                            value,
                            depth,
                            ctx,
                        )
                        .await?;
                    }
                    FieldType::Array { item } => {
                        let (FieldType::Ref { ref_type, .. }, Some(elements)) =
                            (item.field_type(), value.as_array())
                        else {
                            continue;
                        };
                        let lazy = is_lazy(descriptor) || is_lazy(item);
                        for (i, element) in elements.iter().enumerate() {
                            if is_falsy(element) {
                                continue;
                            }
                            let field = format!("{name}[{i}]");
                            self.reference(&field, ref_type.as_deref(), lazy, element, depth, ctx)
                                .await?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        }
        .boxed()
    }

    async fn reference(
        &self,
        field: &str,
        declared: Option<&str>,
        lazy: bool,
        value: &Value,
        depth: usize,
        ctx: &mut CompositionContext,
    ) -> CompositionResult<()> {
        let invalid = || CompositionError::InvalidReference {
            field: field.to_string(),
        };
        let obj = value.as_object().ok_or_else(invalid)?;
        let id = obj.get("id").and_then(Value::as_str).ok_or_else(invalid)?;
        let own_type = obj.get(TYPE_FIELD).and_then(Value::as_str);

        // Checked before any I/O.
        if let (Some(expected), Some(actual)) = (declared, own_type) {
            if expected != actual {
                return Err(CompositionError::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        let target_type = declared.or(own_type).ok_or_else(invalid)?;

        let Some(target) = self.resolver.resolve_entity(target_type, id).await? else {
            return Err(CompositionError::BrokenReference {
                ref_type: target_type.to_string(),
                id: id.to_string(),
                field: field.to_string(),
            });
        };

        if let Some(actual) = target.get(TYPE_FIELD).and_then(Value::as_str) {
            if actual != target_type {
                return Err(CompositionError::TypeMismatch {
                    field: field.to_string(),
                    expected: target_type.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        debug!(field = %field, target_type = %target_type, id = %id, "resolved reference");

        if lazy || !self.options.auto_validate || depth == 0 {
            return Ok(());
        }
        let Some(target_schema) = self.registry.get(target_type) else {
            debug!(target_type = %target_type, "no schema registered, not recursing");
            return Ok(());
        };
        self.entity(
            &target_schema,
            &target,
            Some(EntityKey::new(target_type, id)),
            depth - 1,
            false,
            ctx,
        )
        .await
    }
}
