//! PII transforms for shapeguard.
//!
//! Four passes share one traversal ([`walk`]) and differ only in the
//! [`PiiVisitor`] that handles leaf fields:
//! - [`prepare_for_storage`]: encrypt, hash or clear sensitive fields
//! - [`prepare_for_read`]: decrypt what storage encrypted
//! - [`sanitize_for_log`]: omit, redact or pseudonymize for log output
//! - [`scrub_pii_for_delete`]: null protected values in a stored entity
//!
//! The actual cryptography is injected through [`FieldEncryptor`],
//! [`FieldHasher`] and [`Pseudonymizer`]; `shapeguard-crypto` provides
//! concrete implementations.

mod codec;
mod error;
mod transforms;
mod walk;

pub use codec::{FieldEncryptor, FieldHasher, FnEncryptor, Pseudonymizer};
pub use error::{PiiError, PiiResult};
pub use transforms::{
    encrypted_key, hash_key, prepare_for_read, prepare_for_storage, sanitize_for_log,
    scrub_pii_for_delete, REDACTED,
};
pub use walk::{walk, PiiVisitor};
