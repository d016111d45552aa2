//! The shared PII traversal.
//!
//! Every pass walks a shape the same way the validation engine nests:
//! object children, rich-reference children, and array items. A field whose
//! own policy concerns the visitor is handed to it as a leaf, whole; any other
//! container is descended into. Primitive array items with a policy of their
//! own are handed over one element at a time.

use crate::error::PiiResult;
use serde_json::{Map, Value};
use shapeguard_model::{FieldDescriptor, FieldType, Shape};

/// Leaf strategy for one PII pass.
pub trait PiiVisitor {
    /// Whether `descriptor`'s own policy makes it a leaf for this pass.
    fn applies_to(&self, descriptor: &FieldDescriptor) -> bool;

    /// Transforms one leaf field.
    ///
    /// `source` is the untouched object at the current level; `out` starts
    /// as a copy of it and receives the result.
    fn visit(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> PiiResult<()>;

    /// Transforms one element of an array whose primitive item descriptor
    /// carries the policy. `None` drops the element.
    fn visit_element(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        element: &Value,
    ) -> PiiResult<Option<Value>>;
}

/// Applies `visitor` to every PII-relevant field of `shape` within `source`.
///
/// Keys not declared in the shape pass through unchanged.
pub fn walk<V>(
    shape: &Shape,
    source: &Map<String, Value>,
    visitor: &mut V,
) -> PiiResult<Map<String, Value>>
where
    V: PiiVisitor + ?Sized,
{
    let mut out = source.clone();
    for (name, descriptor) in shape.iter() {
        if visitor.applies_to(descriptor) {
            visitor.visit(name, descriptor, source, &mut out)?;
            continue;
        }
        let Some(value) = source.get(name) else {
            continue;
        };
        match descriptor.field_type() {
            FieldType::Array { item } => {
                let Value::Array(elements) = value else {
                    continue;
                };
                let mapped = if let Some(child) = item.field_type().child_shape() {
                    elements
                        .iter()
                        .map(|element| match element {
                            Value::Object(obj) => walk(child, obj, visitor).map(Value::Object),
                            other => Ok(other.clone()),
                        })
                        .collect::<PiiResult<Vec<_>>>()?
                } else if item.field_type().is_primitive() && visitor.applies_to(item) {
                    let mut kept = Vec::with_capacity(elements.len());
                    for element in elements {
                        if let Some(replacement) = visitor.visit_element(name, item, element)? {
                            kept.push(replacement);
                        }
                    }
                    kept
                } else {
                    continue;
                };
                out.insert(name.to_string(), Value::Array(mapped));
            }
            other => {
                if let (Some(child), Value::Object(obj)) = (other.child_shape(), value) {
                    out.insert(name.to_string(), Value::Object(walk(child, obj, visitor)?));
                }
            }
        }
    }
    Ok(out)
}
