//! Keyed digests for `hash` fields and log pseudonyms.

use crate::key::{purpose, FieldKey};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shapeguard_pii::{FieldHasher, PiiError, PiiResult, Pseudonymizer};

/// Prefix of every pseudonym.
pub const PSEUDONYM_PREFIX: &str = "anon_";

const PSEUDONYM_HEX_LEN: usize = 16;

/// Hex SHA-256 over `key || json(value)`.
///
/// Equal values hash equally under one key, so hashed fields stay usable
/// for exact-match lookups.
#[derive(Clone, Debug)]
pub struct KeyedHasher {
    key: FieldKey,
}

impl KeyedHasher {
    pub fn new(key: FieldKey) -> Self {
        Self { key }
    }

    /// Hasher keyed with the `hash` subkey of `master`.
    pub fn from_master(master: &FieldKey) -> Self {
        Self::new(master.for_purpose(purpose::HASH))
    }

    pub fn digest(&self, value: &Value) -> Result<String, serde_json::Error> {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_bytes());
        hasher.update(serde_json::to_vec(value)?);
        Ok(hex::encode(hasher.finalize()))
    }
}

impl FieldHasher for KeyedHasher {
    fn hash(&self, value: &Value) -> PiiResult<String> {
        self.digest(value)
            .map_err(|e| PiiError::Hashing(e.to_string()))
    }
}

/// Short stable stand-ins for values in log output, e.g. `anon_3fa9c0d1e2b47a65`.
#[derive(Clone, Debug)]
pub struct KeyedPseudonymizer {
    hasher: KeyedHasher,
}

impl KeyedPseudonymizer {
    pub fn new(key: FieldKey) -> Self {
        Self {
            hasher: KeyedHasher::new(key),
        }
    }

    /// Pseudonymizer keyed with the `pseudonym` subkey of `master`, so its
    /// tokens never prefix the stored digests of the same values.
    pub fn from_master(master: &FieldKey) -> Self {
        Self::new(master.for_purpose(purpose::PSEUDONYM))
    }
}

impl Pseudonymizer for KeyedPseudonymizer {
    fn pseudonym(&self, value: &Value) -> PiiResult<String> {
        let digest = self
            .hasher
            .digest(value)
            .map_err(|e| PiiError::Pseudonym(e.to_string()))?;
        Ok(format!("{PSEUDONYM_PREFIX}{}", &digest[..PSEUDONYM_HEX_LEN]))
    }
}
