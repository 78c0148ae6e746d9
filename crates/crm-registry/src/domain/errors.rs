//! # Domain Errors
//!
//! Every failure of the registry is a [`RegistryError`], and every variant
//! maps to exactly one [`ErrorKind`].
//!
//! Error messages carry identifiers, index names and field names only.
//! Plaintext sensitive values never appear in them.

use shared_types::{MetadataError, PaginationError};
use thiserror::Error;
use uuid::Uuid;

use super::value_objects::{EntityKind, LinkType};

/// Coarse classification of registry failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entity absent or excluded by the soft-delete filter.
    NotFound,
    /// Uniqueness or referential rule refused the write.
    Conflict,
    /// Malformed input, rejected before any write.
    Validation,
    /// Codec, store or serialization failure.
    Internal,
}

/// Field codec failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Encryption failed.
    #[error("field encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext malformed, tampered or encrypted under another key.
    #[error("field decryption failed: {0}")]
    Decryption(String),
}

/// Structured unique-index violation reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConflict {
    /// Name of the violated index, when the store reports it.
    pub index: Option<String>,
    /// Conflicting key as `(field, value)` pairs.
    pub key: Vec<(String, String)>,
    /// Raw store message.
    pub message: String,
}

impl StoreConflict {
    /// Value of one key field.
    pub fn key_value(&self, field: &str) -> Option<&str> {
        self.key
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// True when the key contains `field`.
    pub fn has_key(&self, field: &str) -> bool {
        self.key.iter().any(|(name, _)| name == field)
    }
}

/// Document store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("duplicate key: {}", .0.message)]
    DuplicateKey(StoreConflict),

    /// Store unreachable or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Document could not be stored or read back.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Registry error types.
#[derive(Debug, Error)]
pub enum RegistryError {
    // -------------------------------------------------------------------------
    // Not found
    // -------------------------------------------------------------------------
    /// Entity absent or soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind
        entity: EntityKind,
        /// Requested identifier
        id: String,
    },

    /// Alias has no HolderLink.
    #[error("No holder link found for alias {alias_id}")]
    HolderLinkNotFound {
        /// Alias without links
        alias_id: Uuid,
    },

    /// Related party id not present on the Alias.
    #[error("Related party {related_party_id} not found on alias {alias_id}")]
    RelatedPartyNotFound {
        /// Alias searched
        alias_id: Uuid,
        /// Missing related party
        related_party_id: Uuid,
    },

    // -------------------------------------------------------------------------
    // Conflict
    // -------------------------------------------------------------------------
    /// Another active Alias uses this account id.
    #[error("Account id already in use: {account_id}")]
    AccountIdAlreadyExists {
        /// Conflicting account id
        account_id: String,
    },

    /// An Alias with this id already exists.
    #[error("Alias already exists: {alias_id}")]
    AliasAlreadyExists {
        /// Conflicting alias id
        alias_id: String,
    },

    /// The Alias already has an active primary holder.
    #[error("Alias {alias_id} already has a primary holder")]
    PrimaryHolderAlreadyExists {
        /// Alias with an existing primary link
        alias_id: Uuid,
    },

    /// An active link with the same `(alias_id, link_type)` exists.
    #[error("Alias {alias_id} already has a {link_type} link")]
    DuplicateHolderLink {
        /// Alias
        alias_id: Uuid,
        /// Duplicated link type
        link_type: LinkType,
    },

    /// Holder still owns active Aliases.
    #[error("Holder {holder_id} still has {count} active aliases")]
    HolderHasAliases {
        /// Holder
        holder_id: Uuid,
        /// Active aliases
        count: u64,
    },

    /// Unique index violation not mapped to a business rule.
    #[error("Unique constraint violated on {entity}: {}", conflict.message)]
    UniqueViolation {
        /// Entity written
        entity: EntityKind,
        /// Store conflict details
        conflict: StoreConflict,
    },

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------
    /// Link type outside the closed set.
    #[error("Invalid link type: {0}")]
    InvalidLinkType(String),

    /// Related party failed validation.
    #[error("Invalid related party: {0}")]
    InvalidRelatedParty(String),

    /// Metadata or metadata removal path failed validation.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(#[from] MetadataError),

    /// Pagination or filter value rejected.
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    /// Required field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field value violates a rule.
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// Field path
        field: &'static str,
        /// Rule violated
        reason: String,
    },

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------
    /// Field codec failure.
    #[error("Codec failure during {operation} on {entity}: {source}")]
    Codec {
        /// Entity being converted
        entity: EntityKind,
        /// Repository operation
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: CodecError,
    },

    /// Store failure other than a unique violation.
    #[error("Store failure during {operation} on {entity}: {source}")]
    Store {
        /// Entity being accessed
        entity: EntityKind,
        /// Repository operation
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: StoreError,
    },

    /// Document could not be (de)serialized.
    #[error("Serialization failure on {entity}: {reason}")]
    Serialization {
        /// Entity being converted
        entity: EntityKind,
        /// serde message
        reason: String,
    },
}

impl RegistryError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. }
            | Self::HolderLinkNotFound { .. }
            | Self::RelatedPartyNotFound { .. } => ErrorKind::NotFound,

            Self::AccountIdAlreadyExists { .. }
            | Self::AliasAlreadyExists { .. }
            | Self::PrimaryHolderAlreadyExists { .. }
            | Self::DuplicateHolderLink { .. }
            | Self::HolderHasAliases { .. }
            | Self::UniqueViolation { .. } => ErrorKind::Conflict,

            Self::InvalidLinkType(_)
            | Self::InvalidRelatedParty(_)
            | Self::InvalidMetadata(_)
            | Self::InvalidQueryParameter(_)
            | Self::MissingField(_)
            | Self::InvalidField { .. } => ErrorKind::Validation,

            Self::Codec { .. } | Self::Store { .. } | Self::Serialization { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for [`RegistryError::NotFound`].
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True for [`ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<PaginationError> for RegistryError {
    fn from(err: PaginationError) -> Self {
        Self::InvalidQueryParameter(err.to_string())
    }
}
