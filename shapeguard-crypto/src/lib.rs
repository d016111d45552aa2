//! Concrete PII transforms for shapeguard.
//!
//! Implements the transform traits of `shapeguard-pii` with real keys:
//! - [`FieldCipher`]: ChaCha20-Poly1305 for `encrypt` fields
//! - [`KeyedHasher`]: keyed SHA-256 for `hash` fields
//! - [`KeyedPseudonymizer`]: stable `anon_…` tokens for log output
//!
//! All three take a caller-supplied [`FieldKey`]; `from_master` constructors
//! split one master key into per-purpose subkeys.

mod cipher;
mod digest;
mod error;
mod key;

pub use cipher::{FieldCipher, NONCE_SIZE, TAG_SIZE};
pub use digest::{KeyedHasher, KeyedPseudonymizer, PSEUDONYM_PREFIX};
pub use error::{CryptoError, CryptoResult};
pub use key::{purpose, FieldKey, KEY_SIZE};
