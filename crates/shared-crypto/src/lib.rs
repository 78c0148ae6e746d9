//! # Shared Crypto - Field Encryption Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Encrypting sensitive fields at rest |
//! | `hashing` | BLAKE3 keyed / derive-key | Deterministic search tokens, key separation |
//! | `field` | both of the above, hex encoded | String-in / string-out field cipher |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit random nonce per encryption, so the same
//!   plaintext never produces the same ciphertext twice
//! - **BLAKE3 keyed hash**: same plaintext + key always yields the same
//!   token; tokens are useless without the key
//! - **Key separation**: encryption and search keys are derived from
//!   different secrets under different contexts

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod field;
pub mod hashing;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use field::FieldCipher;
pub use hashing::{blake3_derive_key, blake3_keyed_hash, SearchKey};
pub use symmetric::{open, seal, Nonce, SecretKey, NONCE_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
