//! # Field Cipher
//!
//! String-level encryption and search tokens for persisted fields.
//!
//! - ciphertext: lowercase hex of `nonce || ciphertext || tag`
//! - search token: lowercase hex of a BLAKE3 keyed hash (64 chars)

use crate::hashing::{blake3_derive_key, SearchKey};
use crate::symmetric::{open, seal, SecretKey};
use crate::CryptoError;

const ENCRYPTION_CONTEXT: &str = "ledger-crm 2024 field encryption";
const SEARCH_CONTEXT: &str = "ledger-crm 2024 search token";

/// Encrypts, decrypts and tokenizes field values.
#[derive(Clone, Debug)]
pub struct FieldCipher {
    encryption_key: SecretKey,
    search_key: SearchKey,
}

impl FieldCipher {
    /// Build from already-derived keys.
    pub fn new(encryption_key: SecretKey, search_key: SearchKey) -> Self {
        Self {
            encryption_key,
            search_key,
        }
    }

    /// Derive independent encryption and search keys from two secrets.
    pub fn derive(encrypt_secret: &[u8], hash_secret: &[u8]) -> Self {
        Self {
            encryption_key: SecretKey::from_bytes(blake3_derive_key(
                ENCRYPTION_CONTEXT,
                encrypt_secret,
            )),
            search_key: SearchKey::from_bytes(blake3_derive_key(SEARCH_CONTEXT, hash_secret)),
        }
    }

    /// Encrypt a field value.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let sealed = seal(&self.encryption_key, plaintext.as_bytes())?;
        Ok(hex::encode(sealed))
    }

    /// Decrypt a value produced by [`FieldCipher::encrypt`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let sealed = hex::decode(ciphertext).map_err(|_| CryptoError::InvalidEncoding)?;
        let plaintext = open(&self.encryption_key, &sealed)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Deterministic search token for a field value.
    pub fn search_token(&self, plaintext: &str) -> String {
        hex::encode(self.search_key.token(plaintext.as_bytes()))
    }
}
