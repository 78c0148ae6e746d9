//! Alias use cases.

use async_trait::async_trait;
use chrono::Utc;
use shared_types::OrganizationId;
use tracing::info;
use uuid::Uuid;

use super::saga::new_related_parties;
use super::RegistryService;
use crate::domain::{
    validate_create_alias, Alias, AliasQuery, CreateAliasInput, RegistryError, UpdateAliasInput,
};
use crate::ports::AliasApi;

#[async_trait]
impl AliasApi for RegistryService {
    async fn create_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        input: CreateAliasInput,
    ) -> Result<Alias, RegistryError> {
        let link_type = validate_create_alias(&input)?;
        let holder = self.holders.find(org, holder_id, false).await?;

        let now = Utc::now();
        let alias = Alias {
            id: Uuid::new_v4(),
            ledger_id: input.ledger_id,
            account_id: input.account_id,
            holder_id: holder.id,
            document: holder.document,
            alias_type: input.alias_type,
            banking_details: input.banking_details,
            regulatory_fields: input.regulatory_fields,
            related_parties: new_related_parties(input.related_parties)?,
            metadata: input.metadata,
            holder_links: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match link_type {
            Some(link_type) => self.create_alias_with_link(org, alias, link_type).await,
            None => {
                let created = self
                    .aliases
                    .create(org, &alias)
                    .await
                    .map_err(|e| self.constraints.classify_alias_conflict(e))?;
                info!(
                    "[crm-registry] Alias {} created for holder {} without link",
                    created.id, holder_id
                );
                self.enrich(org, created).await
            }
        }
    }

    async fn get_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        include_deleted: bool,
    ) -> Result<Alias, RegistryError> {
        let alias = self
            .aliases
            .find(org, Some(holder_id), alias_id, include_deleted)
            .await?;
        self.enrich(org, alias).await
    }

    async fn list_aliases(
        &self,
        org: &OrganizationId,
        mut query: AliasQuery,
    ) -> Result<Vec<Alias>, RegistryError> {
        query.pagination = Some(self.list_parameters(&query.metadata, query.pagination)?);

        let aliases = self.aliases.find_all(org, &query, false).await?;
        let mut enriched = Vec::with_capacity(aliases.len());
        for alias in aliases {
            enriched.push(self.enrich(org, alias).await?);
        }
        Ok(enriched)
    }

    async fn update_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        input: UpdateAliasInput,
        fields_to_remove: Vec<String>,
    ) -> Result<Alias, RegistryError> {
        self.update_alias_with_link(org, holder_id, alias_id, input, fields_to_remove)
            .await
    }

    async fn delete_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        self.cascade_delete_alias(org, holder_id, alias_id, hard_delete)
            .await
    }

    async fn delete_related_party(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        related_party_id: Uuid,
    ) -> Result<(), RegistryError> {
        self.aliases
            .delete_related_party(org, holder_id, alias_id, related_party_id)
            .await?;
        info!(
            "[crm-registry] Related party {} removed from alias {}",
            related_party_id, alias_id
        );
        Ok(())
    }
}
