//! HolderLink Repository Adapter
//!
//! Implements `HolderLinkRepository` over any `DocumentStore`, one
//! `holder_links_<org>` collection per organization. The collection carries
//! the two partial unique indexes the constraint engine relies on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{OrganizationId, SortOrder};
use tracing::debug;
use uuid::Uuid;

use super::collections::{metadata_filter, TenantCollections};
use crate::constraints::holder_link_indexes;
use crate::domain::{
    validate_fields_to_remove, EntityKind, HolderLink, HolderLinkQuery, HolderLinkUpdate,
    LinkType, RegistryError,
};
use crate::mapper::{decode, encode, holder_link_update, soft_delete, HolderLinkDocument};
use crate::ports::{DocumentStore, FieldCodec, Filter, FindOptions, HolderLinkRepository};

/// HolderLink collection prefix.
pub const HOLDER_LINK_COLLECTION: &str = "holder_links";

/// Document-store backed HolderLink repository.
pub struct DocumentHolderLinkRepository {
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn FieldCodec>,
    collections: TenantCollections,
}

impl DocumentHolderLinkRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, codec: Arc<dyn FieldCodec>) -> Self {
        Self {
            store,
            codec,
            collections: TenantCollections::new(
                EntityKind::HolderLink,
                HOLDER_LINK_COLLECTION,
                holder_link_indexes,
            ),
        }
    }

    /// Every link matching `filter`, oldest first.
    async fn find_unpaged(
        &self,
        org: &OrganizationId,
        filter: Filter,
        operation: &'static str,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let options = FindOptions {
            sort: Some(("created_at".to_string(), SortOrder::Asc)),
            ..Default::default()
        };

        let _timer = self.collections.timer(operation);
        let result = self.store.find(&collection, &filter, &options).await;
        let documents = self.collections.record(operation, result)?;

        self.decode_all(documents, operation)
    }

    fn decode_all(
        &self,
        documents: Vec<crate::ports::Document>,
        operation: &'static str,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        documents
            .into_iter()
            .map(|d| decode::<HolderLinkDocument>(d, self.codec.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(self.collections.mapping(operation))
    }
}

#[async_trait]
impl HolderLinkRepository for DocumentHolderLinkRepository {
    async fn create(
        &self,
        org: &OrganizationId,
        link: &HolderLink,
    ) -> Result<HolderLink, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let document = encode::<HolderLinkDocument>(link, self.codec.as_ref())
            .map_err(self.collections.mapping("create"))?;

        let _timer = self.collections.timer("create");
        let result = self.store.insert_one(&collection, document).await;
        self.collections.record("create", result)?;

        debug!(
            "[crm-registry] HolderLink {} ({}) stored: holder {} -> alias {}",
            link.id, link.link_type, link.holder_id, link.alias_id
        );
        Ok(link.clone())
    }

    async fn find(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<HolderLink, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::by_id(id).active_unless(include_deleted);

        let _timer = self.collections.timer("find");
        let result = self.store.find_one(&collection, &filter).await;
        let document = self
            .collections
            .record("find", result)?
            .ok_or_else(|| self.collections.not_found(id))?;

        decode::<HolderLinkDocument>(document, self.codec.as_ref())
            .map_err(self.collections.mapping("find"))
    }

    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &HolderLinkQuery,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::new()
            .eq_opt("holder_id", query.holder_id.map(|h| h.to_string()))
            .eq_opt("alias_id", query.alias_id.map(|a| a.to_string()))
            .eq_opt("link_type", query.link_type.as_deref())
            .active_unless(include_deleted);
        let filter = metadata_filter(filter, &query.metadata);
        let options = FindOptions::paginated(&query.pagination.unwrap_or_default());

        let _timer = self.collections.timer("find_all");
        let result = self.store.find(&collection, &filter, &options).await;
        let documents = self.collections.record("find_all", result)?;

        self.decode_all(documents, "find_all")
    }

    async fn update(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: &HolderLinkUpdate,
        fields_to_remove: &[String],
    ) -> Result<HolderLink, RegistryError> {
        let removed_keys = validate_fields_to_remove(fields_to_remove)?;
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let changes = holder_link_update(update, &removed_keys, Utc::now())
            .map_err(self.collections.mapping("update"))?;

        let matched = {
            let _timer = self.collections.timer("update");
            let result = self
                .store
                .update_one(&collection, &Filter::by_id(id).active_unless(false), &changes)
                .await;
            self.collections.record("update", result)?
        };
        if matched == 0 {
            return Err(self.collections.not_found(id));
        }

        self.find(org, id, false).await
    }

    async fn delete(
        &self,
        org: &OrganizationId,
        id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::by_id(id).active_unless(hard_delete);

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
        debug!("[crm-registry] HolderLink {} deleted (hard={})", id, hard_delete);
        Ok(())
    }

    async fn find_by_alias_id(
        &self,
        org: &OrganizationId,
        alias_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        let filter = Filter::new()
            .eq("alias_id", alias_id.to_string())
            .active_unless(include_deleted);
        self.find_unpaged(org, filter, "find_by_alias_id").await
    }

    async fn find_by_holder_id(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<HolderLink>, RegistryError> {
        let filter = Filter::new()
            .eq("holder_id", holder_id.to_string())
            .active_unless(include_deleted);
        self.find_unpaged(org, filter, "find_by_holder_id").await
    }

    async fn find_by_alias_id_and_link_type(
        &self,
        org: &OrganizationId,
        alias_id: Uuid,
        link_type: LinkType,
    ) -> Result<Option<HolderLink>, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::new()
            .eq("alias_id", alias_id.to_string())
            .eq("link_type", link_type.as_str())
            .active_unless(false);

        let _timer = self.collections.timer("find_by_alias_id_and_link_type");
        let result = self.store.find_one(&collection, &filter).await;
        self.collections
            .record("find_by_alias_id_and_link_type", result)?
            .map(|d| decode::<HolderLinkDocument>(d, self.codec.as_ref()))
            .transpose()
            .map_err(self.collections.mapping("find_by_alias_id_and_link_type"))
    }
}
