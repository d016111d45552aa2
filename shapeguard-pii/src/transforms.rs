//! The four PII passes.

use crate::codec::{FieldEncryptor, FieldHasher, Pseudonymizer};
use crate::error::{PiiError, PiiResult};
use crate::walk::{walk, PiiVisitor};
use serde_json::{Map, Value};
use shapeguard_model::{FieldDescriptor, LogHandling, PiiAction, Shape};

/// Literal substituted for `redact` fields in log output.
pub const REDACTED: &str = "[REDACTED]";

/// Storage key of an encrypted field.
pub fn encrypted_key(name: &str) -> String {
    format!("{name}Encrypted")
}

/// Storage key of a hashed field.
pub fn hash_key(name: &str) -> String {
    format!("{name}Hash")
}

fn as_object(entity: &Value) -> PiiResult<&Map<String, Value>> {
    entity.as_object().ok_or(PiiError::NotAnObject)
}

fn run<V: PiiVisitor>(shape: &Shape, entity: &Value, mut visitor: V) -> PiiResult<Value> {
    walk(shape, as_object(entity)?, &mut visitor).map(Value::Object)
}

fn present(source: &Map<String, Value>, name: &str) -> Option<Value> {
    source.get(name).filter(|v| !v.is_null()).cloned()
}

// ── Storage ──────────────────────────────────────────────────────

struct StorageVisitor<'a> {
    encryptor: &'a dyn FieldEncryptor,
    hasher: &'a dyn FieldHasher,
}

impl PiiVisitor for StorageVisitor<'_> {
    fn applies_to(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.pii_policy().action != PiiAction::None
    }

    fn visit(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> PiiResult<()> {
        match descriptor.pii_policy().action {
            PiiAction::Encrypt => {
                if let Some(value) = present(source, name) {
                    out.remove(name);
                    let sealed = self.encryptor.encrypt(&value)?;
                    out.insert(encrypted_key(name), Value::String(sealed));
                }
            }
            PiiAction::Hash => {
                if let Some(value) = present(source, name) {
                    out.remove(name);
                    let digest = self.hasher.hash(&value)?;
                    out.insert(hash_key(name), Value::String(digest));
                }
            }
            PiiAction::Clear => {
                if out.contains_key(name) {
                    out.insert(name.to_string(), Value::Null);
                }
            }
            PiiAction::None => {}
        }
        Ok(())
    }

    fn visit_element(
        &mut self,
        _name: &str,
        descriptor: &FieldDescriptor,
        element: &Value,
    ) -> PiiResult<Option<Value>> {
        let stored = match descriptor.pii_policy().action {
            _ if element.is_null() => Value::Null,
            PiiAction::Encrypt => Value::String(self.encryptor.encrypt(element)?),
            PiiAction::Hash => Value::String(self.hasher.hash(element)?),
            PiiAction::Clear => Value::Null,
            PiiAction::None => element.clone(),
        };
        Ok(Some(stored))
    }
}

/// Protects every `encrypt`/`hash`/`clear` field for persistence.
///
/// `encrypt` fields move to `<name>Encrypted`, `hash` fields to `<name>Hash`,
/// `clear` fields are nulled in place. Absent or null values are left alone.
/// Elements of a primitive array are protected in place, keeping the key.
pub fn prepare_for_storage(
    shape: &Shape,
    entity: &Value,
    encryptor: &dyn FieldEncryptor,
    hasher: &dyn FieldHasher,
) -> PiiResult<Value> {
    run(shape, entity, StorageVisitor { encryptor, hasher })
}

// ── Read ─────────────────────────────────────────────────────────

struct ReadVisitor<'a> {
    encryptor: &'a dyn FieldEncryptor,
}

impl PiiVisitor for ReadVisitor<'_> {
    fn applies_to(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.pii_policy().action != PiiAction::None
    }

    fn visit(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> PiiResult<()> {
        match descriptor.pii_policy().action {
            PiiAction::Encrypt => {
                let key = encrypted_key(name);
                if let Some(stored) = source.get(&key) {
                    out.remove(&key);
                    let value = match stored {
                        Value::String(ciphertext) => self.encryptor.decrypt(ciphertext)?,
                        Value::Null => Value::Null,
                        _ => {
                            return Err(PiiError::MalformedStoredValue {
                                field: name.to_string(),
                            });
                        }
                    };
                    out.insert(name.to_string(), value);
                }
            }
            PiiAction::Hash => {
                // Hashes are one-way: the read view surfaces the digest itself.
                let key = hash_key(name);
                if let Some(stored) = source.get(&key) {
                    out.remove(&key);
                    out.insert(name.to_string(), stored.clone());
                }
            }
            PiiAction::Clear => {
                if out.contains_key(name) {
                    out.insert(name.to_string(), Value::Null);
                }
            }
            PiiAction::None => {}
        }
        Ok(())
    }

    fn visit_element(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        element: &Value,
    ) -> PiiResult<Option<Value>> {
        let value = match (descriptor.pii_policy().action, element) {
            (_, Value::Null) => Value::Null,
            (PiiAction::Encrypt, Value::String(ciphertext)) => self.encryptor.decrypt(ciphertext)?,
            (PiiAction::Encrypt, _) => {
                return Err(PiiError::MalformedStoredValue {
                    field: name.to_string(),
                });
            }
            (PiiAction::Clear, _) => Value::Null,
            (PiiAction::Hash | PiiAction::None, other) => other.clone(),
        };
        Ok(Some(value))
    }
}

/// Inverse of [`prepare_for_storage`].
pub fn prepare_for_read(
    shape: &Shape,
    stored: &Value,
    encryptor: &dyn FieldEncryptor,
) -> PiiResult<Value> {
    run(shape, stored, ReadVisitor { encryptor })
}

// ── Log ──────────────────────────────────────────────────────────

struct LogVisitor<'a> {
    pseudonymizer: Option<&'a dyn Pseudonymizer>,
}

impl PiiVisitor for LogVisitor<'_> {
    fn applies_to(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.pii_policy().log_handling != LogHandling::Plain
    }

    fn visit(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> PiiResult<()> {
        match descriptor.pii_policy().log_handling {
            LogHandling::Omit => {
                out.remove(name);
            }
            LogHandling::Redact => {
                if present(source, name).is_some() {
                    out.insert(name.to_string(), Value::String(REDACTED.to_string()));
                }
            }
            LogHandling::Pseudonym => {
                if let Some(value) = present(source, name) {
                    let replacement = match self.pseudonymizer {
                        Some(p) => p.pseudonym(&value)?,
                        None => REDACTED.to_string(),
                    };
                    out.insert(name.to_string(), Value::String(replacement));
                }
            }
            LogHandling::Plain => {}
        }
        Ok(())
    }

    fn visit_element(
        &mut self,
        _name: &str,
        descriptor: &FieldDescriptor,
        element: &Value,
    ) -> PiiResult<Option<Value>> {
        let logged = match descriptor.pii_policy().log_handling {
            LogHandling::Omit => return Ok(None),
            _ if element.is_null() => Value::Null,
            LogHandling::Redact => Value::String(REDACTED.to_string()),
            LogHandling::Pseudonym => Value::String(match self.pseudonymizer {
                Some(p) => p.pseudonym(element)?,
                None => REDACTED.to_string(),
            }),
            LogHandling::Plain => element.clone(),
        };
        Ok(Some(logged))
    }
}

/// Produces a copy of `entity` safe to write to logs.
///
/// Without a pseudonymizer, `pseudonym` fields are redacted.
pub fn sanitize_for_log(
    shape: &Shape,
    entity: &Value,
    pseudonymizer: Option<&dyn Pseudonymizer>,
) -> PiiResult<Value> {
    run(shape, entity, LogVisitor { pseudonymizer })
}

// ── Delete ───────────────────────────────────────────────────────

struct ScrubVisitor;

impl PiiVisitor for ScrubVisitor {
    fn applies_to(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.pii_policy().action != PiiAction::None
    }

    fn visit(
        &mut self,
        name: &str,
        descriptor: &FieldDescriptor,
        _source: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> PiiResult<()> {
        let key = match descriptor.pii_policy().action {
            PiiAction::Encrypt => encrypted_key(name),
            PiiAction::Hash => hash_key(name),
            PiiAction::Clear => name.to_string(),
            PiiAction::None => return Ok(()),
        };
        if out.contains_key(&key) {
            out.insert(key, Value::Null);
        }
        Ok(())
    }

    fn visit_element(
        &mut self,
        _name: &str,
        descriptor: &FieldDescriptor,
        element: &Value,
    ) -> PiiResult<Option<Value>> {
        Ok(Some(match descriptor.pii_policy().action {
            PiiAction::None => element.clone(),
            _ => Value::Null,
        }))
    }
}

/// Nulls protected values of an already-stored entity.
///
/// Looks for the `Encrypted`/`Hash` keys written by [`prepare_for_storage`].
pub fn scrub_pii_for_delete(shape: &Shape, stored: &Value) -> PiiResult<Value> {
    run(shape, stored, ScrubVisitor)
}
