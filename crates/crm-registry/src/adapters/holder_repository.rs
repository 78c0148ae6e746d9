//! Holder Repository Adapter
//!
//! Implements `HolderRepository` over any `DocumentStore`, one
//! `holders_<org>` collection per organization.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::OrganizationId;
use tracing::debug;
use uuid::Uuid;

use super::collections::{metadata_filter, TenantCollections};
use crate::constraints::holder_indexes;
use crate::domain::{
    validate_fields_to_remove, EntityKind, Holder, HolderQuery, HolderUpdate, RegistryError,
};
use crate::mapper::{decode, encode, holder_update, soft_delete, HolderDocument};
use crate::ports::{DocumentStore, FieldCodec, Filter, FindOptions, HolderRepository};

/// Holder collection prefix.
pub const HOLDER_COLLECTION: &str = "holders";

/// Document-store backed Holder repository.
pub struct DocumentHolderRepository {
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn FieldCodec>,
    collections: TenantCollections,
}

impl DocumentHolderRepository {
    /// Create a repository over `store`, encrypting with `codec`.
    pub fn new(store: Arc<dyn DocumentStore>, codec: Arc<dyn FieldCodec>) -> Self {
        Self {
            store,
            codec,
            collections: TenantCollections::new(EntityKind::Holder, HOLDER_COLLECTION, holder_indexes),
        }
    }

    fn query_filter(&self, query: &HolderQuery, include_deleted: bool) -> Filter {
        let filter = Filter::new()
            .eq_opt("external_id", query.external_id.as_deref())
            .eq_opt(
                "search.document",
                query.document.as_deref().map(|d| self.codec.hash(d)),
            )
            .active_unless(include_deleted);
        metadata_filter(filter, &query.metadata)
    }
}

#[async_trait]
impl HolderRepository for DocumentHolderRepository {
    async fn create(&self, org: &OrganizationId, holder: &Holder) -> Result<Holder, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let document = encode::<HolderDocument>(holder, self.codec.as_ref())
            .map_err(self.collections.mapping("create"))?;

        let _timer = self.collections.timer("create");
        let result = self.store.insert_one(&collection, document).await;
        self.collections.record("create", result)?;

        debug!("[crm-registry] Holder {} stored in {}", holder.id, collection);
        Ok(holder.clone())
    }

    async fn find(
        &self,
        org: &OrganizationId,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Holder, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = Filter::by_id(id).active_unless(include_deleted);

        let _timer = self.collections.timer("find");
        let result = self.store.find_one(&collection, &filter).await;
        let document = self
            .collections
            .record("find", result)?
            .ok_or_else(|| self.collections.not_found(id))?;

        decode::<HolderDocument>(document, self.codec.as_ref())
            .map_err(self.collections.mapping("find"))
    }

    async fn find_all(
        &self,
        org: &OrganizationId,
        query: &HolderQuery,
        include_deleted: bool,
    ) -> Result<Vec<Holder>, RegistryError> {
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let filter = self.query_filter(query, include_deleted);
        let options = FindOptions::paginated(&query.pagination.unwrap_or_default());

        let _timer = self.collections.timer("find_all");
        let result = self.store.find(&collection, &filter, &options).await;
        let documents = self.collections.record("find_all", result)?;

        documents
            .into_iter()
            .map(|d| decode::<HolderDocument>(d, self.codec.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(self.collections.mapping("find_all"))
    }

    async fn update(
        &self,
        org: &OrganizationId,
        id: Uuid,
        update: &HolderUpdate,
        fields_to_remove: &[String],
    ) -> Result<Holder, RegistryError> {
        let removed_keys = validate_fields_to_remove(fields_to_remove)?;
        let collection = self.collections.resolve(self.store.as_ref(), org).await?;
        let changes = holder_update(update, &removed_keys, self.codec.as_ref(), Utc::now())
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
        debug!(
            "[crm-registry] Holder {} deleted (hard={})",
            id, hard_delete
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::domain::HolderType;
    use crate::mapper::testing::PrefixCodec;
    use shared_types::{Metadata, MetadataQuery, Pagination};

    fn org() -> OrganizationId {
        OrganizationId::new("org-1").unwrap()
    }

    fn repo() -> (DocumentHolderRepository, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        (
            DocumentHolderRepository::new(store.clone(), Arc::new(PrefixCodec)),
            store,
        )
    }

    fn holder(document: &str) -> Holder {
        let now = Utc::now();
        Holder {
            id: Uuid::new_v4(),
            external_id: None,
            holder_type: HolderType::NaturalPerson,
            name: "Ana".to_string(),
            document: document.to_string(),
            addresses: None,
            contact: None,
            natural_person: None,
            legal_person: None,
            metadata: Metadata::new().with("segment", "retail"),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, store) = repo();
        let stored = repo.create(&org(), &holder("12345678901")).await.unwrap();

        let found = repo.find(&org(), stored.id, false).await.unwrap();
        assert_eq!(found, stored);

        let raw = store.dump("holders_org-1");
        assert_eq!(raw.len(), 1);
        assert_ne!(raw[0]["document"], "12345678901");
    }

    #[tokio::test]
    async fn test_find_all_by_document_token() {
        let (repo, _) = repo();
        let a = repo.create(&org(), &holder("111")).await.unwrap();
        repo.create(&org(), &holder("222")).await.unwrap();

        let query = HolderQuery {
            document: Some("111".to_string()),
            ..Default::default()
        };
        let found = repo.find_all(&org(), &query, false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
    }

    #[tokio::test]
    async fn test_find_all_by_metadata_and_page() {
        let (repo, _) = repo();
        for document in ["1", "2", "3"] {
            repo.create(&org(), &holder(document)).await.unwrap();
        }

        let query = HolderQuery {
            metadata: MetadataQuery::new().with("segment", "retail"),
            pagination: Some(Pagination::new(1, 2)),
            ..Default::default()
        };
        assert_eq!(repo.find_all(&org(), &query, false).await.unwrap().len(), 2);

        let query = HolderQuery {
            metadata: MetadataQuery::new().with("segment", "private"),
            ..Default::default()
        };
        assert!(repo.find_all(&org(), &query, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_removes_metadata() {
        let (repo, _) = repo();
        let stored = repo.create(&org(), &holder("1")).await.unwrap();

        let update = HolderUpdate {
            name: Some("Ana Maria".to_string()),
            metadata: Some(Metadata::new().with("tier", 1i64)),
            ..Default::default()
        };
        let updated = repo
            .update(&org(), stored.id, &update, &["metadata.segment".to_string()])
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.document, "1");
        assert!(updated.metadata.contains_key("tier"));
        assert!(!updated.metadata.contains_key("segment"));
        assert!(updated.updated_at >= stored.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_removal_path() {
        let (repo, _) = repo();
        let stored = repo.create(&org(), &holder("1")).await.unwrap();

        let err = repo
            .update(&org(), stored.id, &HolderUpdate::default(), &["name".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMetadata(_)));
    }

    #[tokio::test]
    async fn test_soft_and_hard_delete() {
        let (repo, _) = repo();
        let stored = repo.create(&org(), &holder("1")).await.unwrap();

        repo.delete(&org(), stored.id, false).await.unwrap();
        assert!(repo.find(&org(), stored.id, false).await.unwrap_err().is_not_found());
        let deleted = repo.find(&org(), stored.id, true).await.unwrap();
        assert!(deleted.deleted_at.is_some());

        // Soft-deleting twice reports not found
        assert!(repo.delete(&org(), stored.id, false).await.unwrap_err().is_not_found());

        repo.delete(&org(), stored.id, true).await.unwrap();
        assert!(repo.find(&org(), stored.id, true).await.unwrap_err().is_not_found());
    }
}
