//! # CRM Registry
//!
//! Multi-tenant persistence for account Holders, their Aliases and the
//! HolderLinks between them.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Encrypt sensitive fields at rest, with deterministic search tokens
//! - Enforce one active PRIMARY_HOLDER per Alias and one active link per
//!   `(alias, link_type)` pair
//! - Create an Alias and its HolderLink together, or not at all
//! - Delete links before the records they reference
//!
//! ## Constraint Layers
//!
//! | Layer | Check |
//! |-------|-------|
//! | Pre-check | Read for an active `(alias, link_type)` link before insert |
//! | Index | Partial unique indexes over active links |
//! | Classification | Index violations mapped to business errors |
//!
//! ## Module Structure
//!
//! ```text
//! crm-registry/
//! ├── domain/        # Entities, inputs, errors, invariants
//! ├── mapper/        # Entity <-> document conversion
//! ├── constraints/   # Index declarations, ConstraintEngine
//! ├── ports/         # API traits + store/repository traits
//! ├── adapters/      # In-memory store, codec, repositories
//! └── service/       # Use cases, write saga, deletion cascade
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod mapper;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    CipherFieldCodec, DocumentAliasRepository, DocumentHolderLinkRepository,
    DocumentHolderRepository, InMemoryDocumentStore,
};
pub use config::{ConfigError, CryptoConfig, PaginationConfig, RegistryConfig};
pub use constraints::ConstraintEngine;
pub use domain::{
    Alias, AliasQuery, AliasUpdate, BankingDetails, CreateAliasInput, CreateHolderInput,
    CreateHolderLinkInput, EntityKind, ErrorKind, Holder, HolderLink, HolderLinkQuery,
    HolderLinkUpdate, HolderQuery, HolderType, HolderUpdate, LinkType, RegistryError,
    RegulatoryFields, RelatedParty, RelatedPartyInput, UpdateAliasInput,
};
pub use ports::{
    AliasApi, AliasRepository, DocumentStore, FieldCodec, HolderApi, HolderLinkApi,
    HolderLinkRepository, HolderRepository,
};
pub use service::{Compensation, CompensationLog, RegistryService, SagaStep};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
