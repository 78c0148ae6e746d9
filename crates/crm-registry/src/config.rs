//! # Registry Configuration
//!
//! Pagination bounds and field-encryption secrets.

use std::env;

use serde::{Deserialize, Serialize};
use shared_types::{Pagination, DEFAULT_PAGE_LIMIT};
use thiserror::Error;

use crate::domain::RegistryError;

/// Length of each secret in bytes.
pub const SECRET_KEY_LEN: usize = 32;

/// Upper bound on a page size.
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    /// Secret is not 64 hex characters.
    #[error("Invalid key in {name}: {reason}")]
    InvalidKey {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Numeric setting could not be parsed.
    #[error("Invalid number in {name}: {value}")]
    InvalidNumber {
        /// Setting name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Page-size bounds for list operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Limit applied when a query has no pagination.
    pub default_limit: u32,
    /// Largest accepted limit.
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

impl PaginationConfig {
    /// Validate a requested page, or produce the default one.
    pub fn resolve(&self, requested: Option<Pagination>) -> Result<Pagination, RegistryError> {
        let pagination = requested.unwrap_or_else(|| Pagination::new(1, self.default_limit));
        pagination.validate(self.max_limit)?;
        Ok(pagination)
    }
}

/// Hex-encoded secrets for the field codec.
///
/// Debug output never prints the secrets.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Secret for field encryption (64 hex chars).
    pub encrypt_secret_key: String,
    /// Secret for search tokens (64 hex chars).
    pub hash_secret_key: String,
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("encrypt_secret_key", &"<redacted>")
            .field("hash_secret_key", &"<redacted>")
            .finish()
    }
}

impl CryptoConfig {
    /// Decode the encryption secret.
    pub fn encrypt_secret(&self) -> Result<[u8; SECRET_KEY_LEN], ConfigError> {
        decode_secret(ENCRYPT_KEY_VAR, &self.encrypt_secret_key)
    }

    /// Decode the search-token secret.
    pub fn hash_secret(&self) -> Result<[u8; SECRET_KEY_LEN], ConfigError> {
        decode_secret(HASH_KEY_VAR, &self.hash_secret_key)
    }
}

/// Registry configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Pagination bounds.
    pub pagination: PaginationConfig,
    /// Codec secrets.
    pub crypto: CryptoConfig,
}

const DEFAULT_LIMIT_VAR: &str = "CRM_DEFAULT_PAGE_LIMIT";
const MAX_LIMIT_VAR: &str = "CRM_MAX_PAGE_LIMIT";
const ENCRYPT_KEY_VAR: &str = "CRM_ENCRYPT_SECRET_KEY";
const HASH_KEY_VAR: &str = "CRM_HASH_SECRET_KEY";

impl RegistryConfig {
    /// Default pagination with the given secrets.
    pub fn new(crypto: CryptoConfig) -> Self {
        Self {
            pagination: PaginationConfig::default(),
            crypto,
        }
    }

    /// Fixed, non-secret keys for tests.
    pub fn for_testing() -> Self {
        Self::new(CryptoConfig {
            encrypt_secret_key: "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff"
                .to_string(),
            hash_secret_key: "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100"
                .to_string(),
        })
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CRM_DEFAULT_PAGE_LIMIT`: page size when none is given (default: 10)
    /// - `CRM_MAX_PAGE_LIMIT`: largest accepted page size (default: 100)
    /// - `CRM_ENCRYPT_SECRET_KEY`: 64 hex chars, required
    /// - `CRM_HASH_SECRET_KEY`: 64 hex chars, required
    pub fn from_env() -> Result<Self, ConfigError> {
        let pagination = PaginationConfig {
            default_limit: env_number(DEFAULT_LIMIT_VAR, DEFAULT_PAGE_LIMIT)?,
            max_limit: env_number(MAX_LIMIT_VAR, DEFAULT_MAX_PAGE_LIMIT)?,
        };

        let crypto = CryptoConfig {
            encrypt_secret_key: env::var(ENCRYPT_KEY_VAR)
                .map_err(|_| ConfigError::MissingVar(ENCRYPT_KEY_VAR))?,
            hash_secret_key: env::var(HASH_KEY_VAR)
                .map_err(|_| ConfigError::MissingVar(HASH_KEY_VAR))?,
        };
        crypto.encrypt_secret()?;
        crypto.hash_secret()?;

        Ok(Self { pagination, crypto })
    }
}

fn env_number(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

fn decode_secret(name: &'static str, value: &str) -> Result<[u8; SECRET_KEY_LEN], ConfigError> {
    let bytes = hex::decode(value.trim()).map_err(|e| ConfigError::InvalidKey {
        name,
        reason: e.to_string(),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| ConfigError::InvalidKey {
        name,
        reason: format!("expected {} bytes, got {}", SECRET_KEY_LEN, bytes.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
    }

    #[test]
    fn test_testing_config_keys_decode() {
        let config = RegistryConfig::for_testing();
        assert!(config.crypto.encrypt_secret().is_ok());
        assert!(config.crypto.hash_secret().is_ok());
    }

    #[test]
    fn test_short_key_rejected() {
        let crypto = CryptoConfig {
            encrypt_secret_key: "abcd".to_string(),
            hash_secret_key: String::new(),
        };
        assert!(matches!(
            crypto.encrypt_secret(),
            Err(ConfigError::InvalidKey { name: "CRM_ENCRYPT_SECRET_KEY", .. })
        ));
        assert!(crypto.hash_secret().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RegistryConfig::for_testing();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("00112233"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_resolve_pagination() {
        let config = PaginationConfig::default();

        let page = config.resolve(None).unwrap();
        assert_eq!((page.page, page.limit), (1, 10));

        assert!(config.resolve(Some(Pagination::new(1, 101))).is_err());
        assert!(config.resolve(Some(Pagination::new(0, 10))).is_err());
        assert!(config.resolve(Some(Pagination::new(3, 100))).is_ok());
    }
}
