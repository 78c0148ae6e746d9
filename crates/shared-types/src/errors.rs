//! # Error Types
//!
//! Validation errors for the shared value types.

use thiserror::Error;

/// Errors raised while validating metadata maps and metadata queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Metadata key is empty.
    #[error("Metadata key must not be empty")]
    EmptyKey,

    /// Metadata key exceeds the allowed length.
    #[error("Metadata key '{key}' exceeds {max} characters")]
    KeyTooLong { key: String, max: usize },

    /// Metadata string value exceeds the allowed length.
    #[error("Metadata value for '{key}' exceeds {max} characters")]
    ValueTooLong { key: String, max: usize },

    /// Key contains a path separator or starts with `$`.
    #[error("Metadata key '{key}' must not contain '.' or start with '$'")]
    ReservedCharacter { key: String },

    /// Nested metadata deeper than one level.
    #[error("Metadata value for '{key}' is nested too deeply")]
    NestingTooDeep { key: String },

    /// Query values must be strings, numbers or booleans.
    #[error("Metadata query value for '{key}' must be a scalar")]
    NonScalarQueryValue { key: String },

    /// Removal path does not address a metadata key.
    #[error("Field '{path}' cannot be removed; only metadata.<key> paths are removable")]
    InvalidRemovalPath { path: String },
}

/// Errors raised while parsing tenant identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// Organization identifier is empty.
    #[error("Organization id must not be empty")]
    Empty,

    /// Organization identifier contains characters unusable in a collection name.
    #[error("Organization id '{0}' contains invalid characters")]
    InvalidCharacters(String),
}

/// Errors raised while validating pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Page numbers start at 1.
    #[error("Page must be at least 1, got {0}")]
    InvalidPage(u32),

    /// Limit outside `1..=max`.
    #[error("Limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: u32, max: u32 },

    /// Unknown sort order literal.
    #[error("Invalid sort order '{0}' (expected asc or desc)")]
    InvalidSortOrder(String),
}
