//! # Inbound Ports
//!
//! API traits defining what the registry can do.

use async_trait::async_trait;
use shared_types::OrganizationId;
use uuid::Uuid;

use crate::domain::{
    Alias, AliasQuery, CreateAliasInput, CreateHolderInput, CreateHolderLinkInput, Holder,
    HolderLink, HolderLinkQuery, HolderLinkUpdate, HolderQuery, HolderUpdate, RegistryError,
    UpdateAliasInput,
};

/// Holder API - inbound port.
#[async_trait]
pub trait HolderApi: Send + Sync {
    /// Create a Holder.
    async fn create_holder(
        &self,
        org: &OrganizationId,
        input: CreateHolderInput,
    ) -> Result<Holder, RegistryError>;

    /// Get a Holder.
    async fn get_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Holder, RegistryError>;

    /// List active Holders.
    async fn list_holders(
        &self,
        org: &OrganizationId,
        query: HolderQuery,
    ) -> Result<Vec<Holder>, RegistryError>;

    /// Partially update a Holder.
    async fn update_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: HolderUpdate,
        fields_to_remove: Vec<String>,
    ) -> Result<Holder, RegistryError>;

    /// Delete a Holder and its HolderLinks. Refused while it owns Aliases.
    async fn delete_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;
}

/// Alias API - inbound port.
#[async_trait]
pub trait AliasApi: Send + Sync {
    /// Create an Alias, and a HolderLink when `input.link_type` is set.
    async fn create_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        input: CreateAliasInput,
    ) -> Result<Alias, RegistryError>;

    /// Get an Alias with its current HolderLinks.
    async fn get_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        include_deleted: bool,
    ) -> Result<Alias, RegistryError>;

    /// List active Aliases with their current HolderLinks.
    async fn list_aliases(
        &self,
        org: &OrganizationId,
        query: AliasQuery,
    ) -> Result<Vec<Alias>, RegistryError>;

    /// Partially update an Alias, optionally attaching a HolderLink.
    async fn update_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        input: UpdateAliasInput,
        fields_to_remove: Vec<String>,
    ) -> Result<Alias, RegistryError>;

    /// Delete an Alias after its HolderLinks.
    async fn delete_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;

    /// Remove one related party from an Alias.
    async fn delete_related_party(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        related_party_id: Uuid,
    ) -> Result<(), RegistryError>;
}

/// HolderLink API - inbound port.
#[async_trait]
pub trait HolderLinkApi: Send + Sync {
    /// Link an existing Holder to an existing Alias.
    async fn create_holder_link(
        &self,
        org: &OrganizationId,
        input: CreateHolderLinkInput,
    ) -> Result<HolderLink, RegistryError>;

    /// Get a HolderLink.
    async fn get_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<HolderLink, RegistryError>;

    /// List active HolderLinks.
    async fn list_holder_links(
        &self,
        org: &OrganizationId,
        query: HolderLinkQuery,
    ) -> Result<Vec<HolderLink>, RegistryError>;

    /// Update HolderLink metadata.
    async fn update_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: HolderLinkUpdate,
        fields_to_remove: Vec<String>,
    ) -> Result<HolderLink, RegistryError>;

    /// Delete a HolderLink.
    async fn delete_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError>;
}
