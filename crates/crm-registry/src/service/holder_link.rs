//! HolderLink use cases.

use async_trait::async_trait;
use shared_types::OrganizationId;
use tracing::info;
use uuid::Uuid;

use super::RegistryService;
use crate::domain::{
    parse_link_type, validate_fields_to_remove, CreateHolderLinkInput, HolderLink,
    HolderLinkQuery, HolderLinkUpdate, LinkType, RegistryError,
};
use crate::ports::HolderLinkApi;

#[async_trait]
impl HolderLinkApi for RegistryService {
    async fn create_holder_link(
        &self,
        org: &OrganizationId,
        input: CreateHolderLinkInput,
    ) -> Result<HolderLink, RegistryError> {
        let link_type = input.link_type.parse::<LinkType>()?;
        input.metadata.validate()?;

        self.holders.find(org, input.holder_id, false).await?;
        self.aliases.find(org, None, input.alias_id, false).await?;

        self.constraints
            .validate(org, input.alias_id, link_type)
            .await?;

        let link = HolderLink::new(input.holder_id, input.alias_id, link_type, input.metadata);
        let created = self
            .holder_links
            .create(org, &link)
            .await
            .map_err(|e| {
                self.constraints
                    .classify_write_conflict(e, input.alias_id, link_type)
            })?;

        info!(
            "[crm-registry] {} link {} created between holder {} and alias {}",
            link_type, created.id, created.holder_id, created.alias_id
        );
        Ok(created)
    }

    async fn get_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<HolderLink, RegistryError> {
        self.holder_links.find(org, id, include_deleted).await
    }

    async fn list_holder_links(
        &self,
        org: &OrganizationId,
        mut query: HolderLinkQuery,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        parse_link_type(query.link_type.as_deref())?;
        query.pagination = Some(self.list_parameters(&query.metadata, query.pagination)?);
        self.holder_links.find_all(org, &query, false).await
    }

    async fn update_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: HolderLinkUpdate,
        fields_to_remove: Vec<String>,
    ) -> Result<HolderLink, RegistryError> {
        validate_fields_to_remove(&fields_to_remove)?;
        if let Some(metadata) = &update.metadata {
            metadata.validate()?;
        }

        self.holder_links
            .update(org, id, &update, &fields_to_remove)
            .await
    }

    async fn delete_holder_link(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        self.holder_links.delete(org, id, hard_delete).await?;
        info!(
            "[crm-registry] Holder link {} deleted ({})",
            id,
            super::mode(hard_delete)
        );
        Ok(())
    }
}
