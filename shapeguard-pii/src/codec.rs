//! Injected transform interfaces.
//!
//! The PII passes never see keys. Callers hand in trait objects; closures
//! work directly for the single-method traits.

use crate::error::PiiResult;
use serde_json::Value;

/// Reversible protection for `encrypt` fields.
pub trait FieldEncryptor: Send + Sync {
    /// Encrypts a field value into an opaque string.
    fn encrypt(&self, value: &Value) -> PiiResult<String>;

    /// Recovers a value produced by [`FieldEncryptor::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> PiiResult<Value>;
}

/// One-way protection for `hash` fields.
pub trait FieldHasher: Send + Sync {
    fn hash(&self, value: &Value) -> PiiResult<String>;
}

/// Stable replacement for `pseudonym` fields in log output.
pub trait Pseudonymizer: Send + Sync {
    fn pseudonym(&self, value: &Value) -> PiiResult<String>;
}

impl<F> FieldHasher for F
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn hash(&self, value: &Value) -> PiiResult<String> {
        Ok(self(value))
    }
}

impl<F> Pseudonymizer for F
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn pseudonym(&self, value: &Value) -> PiiResult<String> {
        Ok(self(value))
    }
}

/// Adapts a pair of infallible closures into a [`FieldEncryptor`].
pub struct FnEncryptor<E, D> {
    encrypt: E,
    decrypt: D,
}

impl<E, D> FnEncryptor<E, D>
where
    E: Fn(&Value) -> String + Send + Sync,
    D: Fn(&str) -> Value + Send + Sync,
{
    pub fn new(encrypt: E, decrypt: D) -> Self {
        Self { encrypt, decrypt }
    }
}

impl<E, D> FieldEncryptor for FnEncryptor<E, D>
where
    E: Fn(&Value) -> String + Send + Sync,
    D: Fn(&str) -> Value + Send + Sync,
{
    fn encrypt(&self, value: &Value) -> PiiResult<String> {
        Ok((self.encrypt)(value))
    }

    fn decrypt(&self, ciphertext: &str) -> PiiResult<Value> {
        Ok((self.decrypt)(ciphertext))
    }
}
