//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: field codec, in-memory document store and
//! the document-backed repositories.

mod alias_repository;
mod collections;
mod field_codec;
mod holder_link_repository;
mod holder_repository;
mod memory_store;

pub use alias_repository::{DocumentAliasRepository, ALIAS_COLLECTION};
pub use field_codec::CipherFieldCodec;
pub use holder_link_repository::{DocumentHolderLinkRepository, HOLDER_LINK_COLLECTION};
pub use holder_repository::{DocumentHolderRepository, HOLDER_COLLECTION};
pub use memory_store::InMemoryDocumentStore;
