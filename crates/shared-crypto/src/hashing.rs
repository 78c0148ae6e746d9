//! # BLAKE3 Hashing
//!
//! Keyed hashing for search tokens and context-separated key derivation.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Keyed hash (MAC).
pub fn blake3_keyed_hash(key: &[u8; 32], data: &[u8]) -> Hash {
    *blake3::keyed_hash(key, data).as_bytes()
}

/// Derive key from context and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, key_material)
}

/// Key used to produce deterministic search tokens.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SearchKey([u8; 32]);

impl SearchKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Token for `data`: same key and input always give the same token.
    pub fn token(&self, data: &[u8]) -> Hash {
        blake3_keyed_hash(&self.0, data)
    }
}

impl std::fmt::Debug for SearchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SearchKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_hash() {
        let key = [0xABu8; 32];
        let h1 = blake3_keyed_hash(&key, b"data");
        let h2 = blake3_keyed_hash(&key, b"data");
        let h3 = blake3_keyed_hash(&[0xCDu8; 32], b"data");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_derive_key_context_separation() {
        let a = blake3_derive_key("ledger-crm field encryption", b"master");
        let b = blake3_derive_key("ledger-crm search token", b"master");
        assert_ne!(a, b);
    }

    #[test]
    fn test_search_key_distinguishes_inputs() {
        let key = SearchKey::from_bytes([7u8; 32]);
        assert_eq!(key.token(b"123"), key.token(b"123"));
        assert_ne!(key.token(b"123"), key.token(b"124"));
    }
}
