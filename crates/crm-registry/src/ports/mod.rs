//! # Ports Layer (Hexagonal Architecture)
//!
//! - `inbound`: what the registry offers (Holder/Alias/HolderLink APIs)
//! - `outbound`: what it needs (codec, document store, repositories)
//! - `store`: filter, index and update types shared by store implementations

pub mod inbound;
pub mod outbound;
pub mod store;

pub use crate::domain::{CodecError, StoreConflict, StoreError};
pub use inbound::{AliasApi, HolderApi, HolderLinkApi};
pub use outbound::{
    AliasRepository, DocumentStore, FieldCodec, HolderLinkRepository, HolderRepository,
};
pub use store::{
    lookup, Condition, Document, Filter, FindOptions, IndexSpec, UpdateDocument,
    DELETED_AT_FIELD, ID_FIELD,
};
