//! # Outbound Ports
//!
//! Traits for the registry's dependencies: the field codec, the document
//! store, and the per-entity repositories built on top of them.

use async_trait::async_trait;
use shared_types::OrganizationId;
use uuid::Uuid;

use super::store::{Document, Filter, FindOptions, IndexSpec, UpdateDocument};
use crate::domain::{
    Alias, AliasQuery, AliasUpdate, CodecError, Holder, HolderLink, HolderLinkQuery,
    HolderLinkUpdate, HolderQuery, HolderUpdate, LinkType, RegistryError, StoreError,
};

/// Encrypted-field codec - outbound port.
///
/// `encrypt` may be non-deterministic; `hash` must be deterministic.
pub trait FieldCodec: Send + Sync {
    /// Encrypt a plaintext field value.
    fn encrypt(&self, plaintext: &str) -> Result<String, CodecError>;

    /// Decrypt a value produced by [`FieldCodec::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError>;

    /// Search token for equality lookups.
    fn hash(&self, plaintext: &str) -> String;
}

/// Document store - outbound port.
///
/// Unique indexes are checked atomically with each write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declare indexes on a collection. Existing names are left untouched.
    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec])
        -> Result<(), StoreError>;

    /// Insert a document.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// First document matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, StoreError>;

    /// All documents matching `filter`, after skip/limit/sort.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply `update` to the first matching document. Returns matched count.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<u64, StoreError>;

    /// Remove the first matching document. Returns deleted count.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Count matching documents.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}

/// Holder persistence - outbound port.
#[async_trait]
pub trait HolderRepository: Send + Sync {
    /// Persist a new Holder.
    async fn create(&self, org: &OrganizationId, holder: &Holder) -> Result<Holder, RegistryError>;

    /// Holder by id.
    async fn find(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Holder, RegistryError>;

    /// Holders matching `query`.
    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &HolderQuery,
        include_deleted: bool,
    ) -> Result<Vec<Holder>, RegistryError>;

    /// Apply a partial update and remove `metadata.<key>` paths.
    async fn update(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: &HolderUpdate,
        fields_to_remove: &[String],
    ) -> Result<Holder, RegistryError>;

    /// Soft or hard delete.
    async fn delete(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;
}

/// Alias persistence - outbound port.
///
/// Returned Aliases have empty `holder_links`; enrichment is done by the
/// service.
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Persist a new Alias.
    async fn create(&self, org: &OrganizationId, alias: &Alias) -> Result<Alias, RegistryError>;

    /// Alias by id, optionally scoped to its Holder.
    async fn find(
        &self,
        org: &OrganizationId,
        holder_id: Option<Uuid>,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Alias, RegistryError>;

    /// Aliases matching `query`.
    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &AliasQuery,
        include_deleted: bool,
    ) -> Result<Vec<Alias>, RegistryError>;

    /// Apply a partial update and remove `metadata.<key>` paths.
    async fn update(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        id: Uuid,
        update: &AliasUpdate,
        fields_to_remove: &[String],
    ) -> Result<Alias, RegistryError>;

    /// Soft or hard delete.
    async fn delete(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;

    /// Active Aliases owned by a Holder.
    async fn count(&self, org: &OrganizationId, holder_id: Uuid) -> Result<u64, RegistryError>;

    /// Remove one related party from an Alias.
    async fn delete_related_party(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        related_party_id: Uuid,
    ) -> Result<(), RegistryError>;
}

/// HolderLink persistence - outbound port.
#[async_trait]
pub trait HolderLinkRepository: Send + Sync {
    /// Persist a new HolderLink.
    async fn create(
        &self,
        org: &OrganizationId,
        link: &HolderLink,
    ) -> Result<HolderLink, RegistryError>;

    /// HolderLink by id.
    async fn find(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<HolderLink, RegistryError>;

    /// HolderLinks matching `query`.
    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &HolderLinkQuery,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError>;

    /// Apply a partial update and remove `metadata.<key>` paths.
    async fn update(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: &HolderLinkUpdate,
        fields_to_remove: &[String],
    ) -> Result<HolderLink, RegistryError>;

    /// Soft or hard delete.
    async fn delete(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;

    /// Links attached to an Alias.
    async fn find_by_alias_id(
        &self,
        org: &OrganizationId,
        alias_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError>;

    /// Links owned by a Holder.
    async fn find_by_holder_id(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError>;

    /// Active link for an `(alias_id, link_type)` pair.
    async fn find_by_alias_id_and_link_type(
        &self,
        org: &OrganizationId,
        alias_id: Uuid,
        link_type: LinkType,
    ) -> Result<Option<HolderLink>, RegistryError>;
}
