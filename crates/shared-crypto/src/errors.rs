//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// Messages never include plaintext or key material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key or tampered ciphertext)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Sealed payload shorter than a nonce plus authentication tag
    #[error("Malformed ciphertext: {0} bytes is too short")]
    MalformedCiphertext(usize),

    /// Ciphertext or key is not valid hex
    #[error("Invalid hex encoding")]
    InvalidEncoding,

    /// Decrypted bytes are not valid UTF-8
    #[error("Decrypted field is not valid UTF-8")]
    InvalidUtf8,
}
