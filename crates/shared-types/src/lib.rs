//! # Shared Types Crate
//!
//! Value types used across the registry crates.
//!
//! ## Design Principles
//!
//! - **Tenant Isolation**: every persisted collection is derived from an
//!   [`OrganizationId`]; there is no way to name a collection without one.
//! - **Explicit Metadata**: free-form metadata is a typed key/value container
//!   ([`Metadata`]) with a separate list of keys to remove on partial updates.
//! - **Bounded Reads**: list operations always go through [`Pagination`].

pub mod errors;
pub mod metadata;
pub mod pagination;
pub mod tenant;

pub use errors::*;
pub use metadata::{
    Metadata, MetadataQuery, MetadataValue, MAX_METADATA_KEY_LENGTH, MAX_METADATA_VALUE_LENGTH,
    METADATA_PREFIX,
};
pub use pagination::{Pagination, SortOrder, DEFAULT_PAGE_LIMIT};
pub use tenant::OrganizationId;
