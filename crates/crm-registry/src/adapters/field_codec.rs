//! Field Codec Adapter
//!
//! Implements the `FieldCodec` port over [`shared_crypto::FieldCipher`].

use shared_crypto::FieldCipher;

use crate::config::{ConfigError, CryptoConfig};
use crate::domain::CodecError;
use crate::ports::FieldCodec;

/// XChaCha20-Poly1305 ciphertext and BLAKE3 keyed search tokens.
#[derive(Clone, Debug)]
pub struct CipherFieldCodec {
    cipher: FieldCipher,
}

impl CipherFieldCodec {
    /// Wrap an existing cipher.
    pub fn new(cipher: FieldCipher) -> Self {
        Self { cipher }
    }

    /// Derive encryption and search keys from configured secrets.
    pub fn from_config(config: &CryptoConfig) -> Result<Self, ConfigError> {
        let encrypt_secret = config.encrypt_secret()?;
        let hash_secret = config.hash_secret()?;
        Ok(Self::new(FieldCipher::derive(&encrypt_secret, &hash_secret)))
    }
}

impl FieldCodec for CipherFieldCodec {
    fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        self.cipher
            .encrypt(plaintext)
            .map_err(|e| CodecError::Encryption(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        self.cipher
            .decrypt(ciphertext)
            .map_err(|e| CodecError::Decryption(e.to_string()))
    }

    fn hash(&self, plaintext: &str) -> String {
        self.cipher.search_token(plaintext)
    }
}
