//! Error types for the PII layer.

use thiserror::Error;

/// Result type for PII transforms.
pub type PiiResult<T> = Result<T, PiiError>;

/// Errors raised while transforming an entity's PII fields.
#[derive(Debug, Error)]
pub enum PiiError {
    /// The entity is not a JSON object.
    #[error("entity must be an object")]
    NotAnObject,

    /// The injected encryptor failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The injected decryptor failed.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The injected hasher failed.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// The injected pseudonymizer failed.
    #[error("pseudonymization failed: {0}")]
    Pseudonym(String),

    /// A stored ciphertext was not a string.
    #[error("stored value for field {field} is not a string")]
    MalformedStoredValue { field: String },
}
