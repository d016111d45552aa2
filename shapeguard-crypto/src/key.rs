//! Field keys and per-purpose subkeys.
//!
//! Callers own the master key (from a KMS, a vault, an env secret). Each
//! protection purpose gets its own subkey so a digest written to storage never
//! matches a pseudonym written to a log.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of field keys in bytes.
pub const KEY_SIZE: usize = 32;

const SUBKEY_DOMAIN: &[u8] = b"shapeguard/field-key/v1";

/// 256-bit secret behind a cipher, hasher or pseudonymizer. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FieldKey {
    bytes: [u8; KEY_SIZE],
}

impl FieldKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Accepts caller key material, which must be exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(material: &[u8]) -> CryptoResult<Self> {
        let bytes = <[u8; KEY_SIZE]>::try_from(material).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: material.len(),
            }
        })?;
        Ok(Self { bytes })
    }

    /// A fresh key from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derives the subkey for `purpose`: one of the [`purpose`] labels, or a
    /// caller label such as a `PiiPolicy` purpose (`"billing"`).
    ///
    /// Deterministic per (key, purpose); distinct purposes give unrelated keys.
    pub fn for_purpose(&self, purpose: &str) -> FieldKey {
        let mut hasher = Sha256::new();
        hasher.update(SUBKEY_DOMAIN);
        hasher.update((purpose.len() as u64).to_be_bytes());
        hasher.update(purpose.as_bytes());
        hasher.update(self.bytes);
        Self {
            bytes: hasher.finalize().into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldKey([REDACTED])")
    }
}

/// Purpose labels used by the built-in transforms.
pub mod purpose {
    pub const ENCRYPT: &str = "encrypt";
    pub const HASH: &str = "hash";
    pub const PSEUDONYM: &str = "pseudonym";
}
