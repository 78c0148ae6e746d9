//! Alias Repository Adapter
//!
//! Implements `AliasRepository` over any `DocumentStore`, one
//! `aliases_<org>` collection per organization. Encrypted filters are
//! matched through their search tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::OrganizationId;
use tracing::debug;
use uuid::Uuid;

use super::collections::{metadata_filter, TenantCollections};
use crate::constraints::alias_indexes;
use crate::domain::{
    validate_fields_to_remove, Alias, AliasQuery, AliasUpdate, EntityKind, RegistryError,
};
use crate::mapper::{alias_update, decode, encode, soft_delete, AliasDocument};
use crate::ports::{AliasRepository, DocumentStore, FieldCodec, Filter, FindOptions};

/// Alias collection prefix.
pub const ALIAS_COLLECTION: &str = "aliases";

/// Document-store backed Alias repository.
pub struct DocumentAliasRepository {
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn FieldCodec>,
    collections: TenantCollections,
}

impl DocumentAliasRepository {
    /// Create a repository over `store`, encrypting with `codec`.
    pub fn new(store: Arc<dyn DocumentStore>, codec: Arc<dyn FieldCodec>) -> Self {
        Self {
            store,
            codec,
            collections: TenantCollections::new(EntityKind::Alias, ALIAS_COLLECTION, alias_indexes),
        }
    }

    fn token(&self, value: Option<&str>) -> Option<String> {
        value.map(|v| self.codec.hash(v))
    }

    fn scoped(holder_id: Option<Uuid>, id: Uuid) -> Filter {
        Filter::by_id(id).eq_opt("holder_id", holder_id.map(|h| h.to_string()))
    }

    fn query_filter(&self, query: &AliasQuery, include_deleted: bool) -> Filter {
        let filter = Filter::new()
            .eq_opt("holder_id", query.holder_id.map(|h| h.to_string()))
            .eq_opt("account_id", query.account_id.as_deref())
            .eq_opt("ledger_id", query.ledger_id.as_deref())
            .eq_opt("banking_details.branch", query.banking_details_branch.as_deref())
            .eq_opt("search.document", self.token(query.document.as_deref()))
            .eq_opt(
                "search.banking_details_account",
                self.token(query.banking_details_account.as_deref()),
            )
            .eq_opt(
                "search.banking_details_iban",
                self.token(query.banking_details_iban.as_deref()),
            )
            .eq_opt(
                "search.regulatory_fields_participant_document",
                self.token(query.regulatory_fields_participant_document.as_deref()),
            )
            .eq_opt(
                "search.related_party_documents",
                self.token(query.related_party_document.as_deref()),
            )
            .active_unless(include_deleted);
        metadata_filter(filter, &query.metadata)
    }
}

#[async_trait]
impl AliasRepository for DocumentAliasRepository {
    async fn create(&self, org: &OrganizationId, alias: &Alias) -> Result<Alias, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let document = encode::<AliasDocument>(alias, self.codec.as_ref())
            .map_err(self.collections.mapping("create"))?;

        let _timer = self.collections.timer("create");
        let result = self.store.insert_one(&collection, document).await;
        self.collections.record("create", result)?;

        debug!(
            "[crm-registry] Alias {} stored in {} for holder {}",
            alias.id, collection, alias.holder_id
        );
        Ok(Alias {
            holder_links: Vec::new(),
            ..alias.clone()
        })
    }

    async fn find(
        &self,
        org: &OrganizationId,
        holder_id: Option<Uuid>,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Alias, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Self::scoped(holder_id, id).active_unless(include_deleted);

        let _timer = self.collections.timer("find");
        let result = self.store.find_one(&collection, &filter).await;
        let document = self
            .collections
            .record("find", result)?
            .ok_or_else(|| self.collections.not_found(id))?;

        decode::<AliasDocument>(document, self.codec.as_ref())
            .map_err(self.collections.mapping("find"))
    }

    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &AliasQuery,
        include_deleted: bool,
    ) -> Result<Vec<Alias>, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = self.query_filter(query, include_deleted);
        let options = FindOptions::paginated(&query.pagination.unwrap_or_default());

        let _timer = self.collections.timer("find_all");
        let result = self.store.find(&collection, &filter, &options).await;
        let documents = self.collections.record("find_all", result)?;

        documents
            .into_iter()
            .map(|d| decode::<AliasDocument>(d, self.codec.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(self.collections.mapping("find_all"))
    }

    async fn update(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        id: Uuid,
        update: &AliasUpdate,
        fields_to_remove: &[String],
    ) -> Result<Alias, RegistryError> {
        let removed_keys = validate_fields_to_remove(fields_to_remove)?;
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let changes = alias_update(update, &removed_keys, self.codec.as_ref(), Utc::now())
            .map_err(self.collections.mapping("update"))?;
        let filter = Self::scoped(Some(holder_id), id).active_unless(false);

        let matched = {
            let _timer = self.collections.timer("update");
            let result = self.store.update_one(&collection, &filter, &changes).await;
            self.collections.record("update", result)?
        };
        if matched == 0 {
            return Err(self.collections.not_found(id));
        }

        self.find(org, Some(holder_id), id, false).await
    }

    async fn delete(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Self::scoped(Some(holder_id), id).active_unless(hard_delete);

        let affected = if hard_delete {
            let _timer = self.collections.timer("hard_delete");
            let result = self.store.delete_one(&collection, &filter).await;
            self.collections.record("hard_delete", result)?
        } else {
            let changes = soft_delete(Utc::now()).map_err(self.collections.mapping("delete"))?;
            let _timer = self.collections.timer("soft_delete");
            let result = self.store.update_one(&collection, &filter, &changes).await;
            self.collections.record("soft_delete", result)?
        };

        if affected == 0 {
            return Err(self.collections.not_found(id));
        }
        debug!("[crm-registry] Alias {} deleted (hard={})", id, hard_delete);
        Ok(())
    }

    async fn count(&self, org: &OrganizationId, holder_id: Uuid) -> Result<u64, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::new()
            .eq("holder_id", holder_id.to_string())
            .active_unless(false);

        let _timer = self.collections.timer("count");
        let result = self.store.count(&collection, &filter).await;
        self.collections.record("count", result)
    }

    async fn delete_related_party(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        related_party_id: Uuid,
    ) -> Result<(), RegistryError> {
        let alias = self.find(org, Some(holder_id), alias_id, false).await?;

        let before = alias.related_parties.len();
        let remaining: Vec<_> = alias
            .related_parties
            .into_iter()
            .filter(|party| party.id != related_party_id)
            .collect();
        if remaining.len() == before {
            return Err(RegistryError::RelatedPartyNotFound {
                alias_id,
                related_party_id,
            });
        }

        let update = AliasUpdate {
            related_parties: Some(remaining),
            ..Default::default()
        };
        self.update(org, holder_id, alias_id, &update, &[]).await?;

        debug!(
            "[crm-registry] Related party {} removed from alias {}",
            related_party_id, alias_id
        );
        Ok(())
    }
}
