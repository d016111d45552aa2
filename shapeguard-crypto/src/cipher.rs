//! Field encryption using ChaCha20-Poly1305.
//!
//! A sealed field is `base64(nonce || ciphertext || tag)`, with a fresh
//! random nonce per call. The plaintext is the field's JSON encoding, so any
//! value kind survives the round trip.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{purpose, FieldKey};
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde_json::Value;
use shapeguard_pii::{FieldEncryptor, PiiError, PiiResult};

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Authenticated encryption for `encrypt` fields.
#[derive(Clone, Debug)]
pub struct FieldCipher {
    key: FieldKey,
}

impl FieldCipher {
    pub fn new(key: FieldKey) -> Self {
        Self { key }
    }

    /// Cipher keyed with the `encrypt` subkey of `master`.
    pub fn from_master(master: &FieldKey) -> Self {
        Self::new(master.for_purpose(purpose::ENCRYPT))
    }

    /// Encrypts raw bytes into the sealed string form.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<String> {
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut bytes = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(&bytes))
    }

    /// Reverses [`FieldCipher::seal`].
    pub fn open(&self, sealed: &str) -> CryptoResult<Vec<u8>> {
        let bytes = STANDARD
            .decode(sealed)
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption("data too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
            })
    }

    pub fn encrypt_value(&self, value: &Value) -> CryptoResult<String> {
        self.seal(&serde_json::to_vec(value)?)
    }

    pub fn decrypt_value(&self, sealed: &str) -> CryptoResult<Value> {
        Ok(serde_json::from_slice(&self.open(sealed)?)?)
    }
}

impl FieldEncryptor for FieldCipher {
    fn encrypt(&self, value: &Value) -> PiiResult<String> {
        self.encrypt_value(value)
            .map_err(|e| PiiError::Encryption(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &str) -> PiiResult<Value> {
        self.decrypt_value(ciphertext)
            .map_err(|e| PiiError::Decryption(e.to_string()))
    }
}
