//! Holder use cases.

use async_trait::async_trait;
use chrono::Utc;
use shared_types::OrganizationId;
use tracing::info;
use uuid::Uuid;

use super::RegistryService;
use crate::domain::{
    validate_create_holder, validate_fields_to_remove, validate_holder_update, CreateHolderInput,
    Holder, HolderQuery, HolderUpdate, RegistryError,
};
use crate::ports::HolderApi;

#[async_trait]
impl HolderApi for RegistryService {
    async fn create_holder(
        &self,
        org: &OrganizationId,
        input: CreateHolderInput,
    ) -> Result<Holder, RegistryError> {
        validate_create_holder(&input)?;

        let now = Utc::now();
        let holder = Holder {
            id: Uuid::new_v4(),
            external_id: input.external_id,
            holder_type: input.holder_type,
            name: input.name,
            document: input.document,
            addresses: input.addresses,
            contact: input.contact,
            natural_person: input.natural_person,
            legal_person: input.legal_person,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self.holders.create(org, &holder).await?;
        info!("[crm-registry] Holder {} created in {}", created.id, org);
        Ok(created)
    }

    async fn get_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Holder, RegistryError> {
        self.holders.find(org, id, include_deleted).await
    }

    async fn list_holders(
        &self,
        org: &OrganizationId,
        mut query: HolderQuery,
    ) -> Result<Vec<Holder>, RegistryError> {
        query.pagination = Some(self.list_parameters(&query.metadata, query.pagination)?);
        self.holders.find_all(org, &query, false).await
    }

    async fn update_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: HolderUpdate,
        fields_to_remove: Vec<String>,
    ) -> Result<Holder, RegistryError> {
        validate_fields_to_remove(&fields_to_remove)?;
        let existing = self.holders.find(org, id, false).await?;
        validate_holder_update(existing.holder_type, &update)?;

        let updated = self
            .holders
            .update(org, id, &update, &fields_to_remove)
            .await?;
        info!("[crm-registry] Holder {} updated", id);
        Ok(updated)
    }

    async fn delete_holder(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        self.cascade_delete_holder(org, id, hard_delete).await
    }
}
