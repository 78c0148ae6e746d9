//! In-Memory Document Store Adapter
//!
//! Implements `DocumentStore` with collections of JSON documents guarded by
//! a single lock. Unique indexes (including partial ones) are checked under
//! the write lock, so concurrent conflicting writes resolve to exactly one
//! winner, as they would against a real document database.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::SortOrder;
use tracing::{debug, trace};

use crate::constraints::PRIMARY_KEY_INDEX;
use crate::ports::{
    lookup, Document, DocumentStore, Filter, FindOptions, IndexSpec, StoreConflict, StoreError,
    UpdateDocument, ID_FIELD,
};

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

impl Collection {
    fn position(&self, filter: &Filter) -> Option<usize> {
        self.documents.iter().position(|d| filter.matches(d))
    }

    /// First unique index `candidate` would violate. `own` is the position
    /// of the document being replaced, if any.
    fn violation(&self, name: &str, candidate: &Document, own: Option<usize>) -> Option<StoreConflict> {
        let others = || {
            self.documents
                .iter()
                .enumerate()
                .filter(move |(i, _)| Some(*i) != own)
                .map(|(_, d)| d)
        };

        let id = candidate.get(ID_FIELD);
        if others().any(|d| d.get(ID_FIELD) == id) {
            let key = vec![(ID_FIELD.to_string(), id.map(key_text).unwrap_or_default())];
            return Some(conflict(name, PRIMARY_KEY_INDEX, key));
        }

        for index in self.indexes.iter().filter(|i| i.unique) {
            if !index.covers(candidate) {
                continue;
            }
            let key = index_key(index, candidate);
            if others().any(|d| index.covers(d) && index_key(index, d) == key) {
                let key = index
                    .keys
                    .iter()
                    .cloned()
                    .zip(key.iter().map(key_text))
                    .collect();
                return Some(conflict(name, &index.name, key));
            }
        }
        None
    }
}

/// In-memory document store.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in a collection, deleted ones included.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    /// Raw stored documents of a collection.
    pub fn dump(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Names of the indexes declared on a collection.
    pub fn index_names(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ensure_indexes(
        &self,
        collection: &str,
        indexes: &[IndexSpec],
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        for index in indexes {
            if entry.indexes.iter().all(|i| i.name != index.name) {
                debug!("[crm-registry] Creating index {} on {}", index.name, collection);
                entry.indexes.push(index.clone());
            }
        }
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        if document.get(ID_FIELD).map_or(true, Value::is_null) {
            return Err(StoreError::InvalidDocument(format!(
                "document without {} in {}",
                ID_FIELD, collection
            )));
        }

        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        if let Some(conflict) = entry.violation(collection, &document, None) {
            debug!("[crm-registry] Insert rejected: {}", conflict.message);
            return Err(StoreError::DuplicateKey(conflict));
        }

        trace!("[crm-registry] Inserted into {}", collection);
        entry.documents.push(document);
        Ok(())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut matched: Vec<Document> = {
            let collections = self.collections.read();
            match collections.get(collection) {
                Some(c) => c.documents.iter().filter(|d| filter.matches(d)).cloned().collect(),
                None => return Ok(Vec::new()),
            }
        };

        if let Some((path, order)) = &options.sort {
            matched.sort_by(|a, b| {
                let ordering = compare(lookup(a, path), lookup(b, path));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(position) = entry.position(filter) else {
            return Ok(0);
        };

        let mut updated = entry.documents[position].clone();
        update.apply_to(&mut updated);

        if let Some(conflict) = entry.violation(collection, &updated, Some(position)) {
            debug!("[crm-registry] Update rejected: {}", conflict.message);
            return Err(StoreError::DuplicateKey(conflict));
        }

        entry.documents[position] = updated;
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match entry.position(filter) {
            Some(position) => {
                entry.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read();
        let count = collections
            .get(collection)
            .map_or(0, |c| c.documents.iter().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }
}

fn index_key(index: &IndexSpec, document: &Document) -> Vec<Value> {
    index
        .keys
        .iter()
        .map(|path| lookup(document, path).cloned().unwrap_or(Value::Null))
        .collect()
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn conflict(collection: &str, index: &str, key: Vec<(String, String)>) -> StoreConflict {
    let rendered = key
        .iter()
        .map(|(field, value)| format!("{}: \"{}\"", field, value))
        .collect::<Vec<_>>()
        .join(", ");
    StoreConflict {
        index: Some(index.to_string()),
        message: format!(
            "E11000 duplicate key error collection: {} index: {} dup key: {{ {} }}",
            collection, index, rendered
        ),
        key,
    }
}

/// Timestamps compare chronologically, numbers numerically, anything else
/// by its text. Absent and null sort first.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => key_text(x).cmp(&key_text(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::Pagination;

    const COLLECTION: &str = "holder_links_org";

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn primary_index() -> IndexSpec {
        IndexSpec::new("one_primary", &["alias_id"]).unique().partial(
            Filter::new()
                .eq("link_type", "PRIMARY_HOLDER")
                .is_null("deleted_at"),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(COLLECTION, doc(json!({"_id": "1", "alias_id": "a"})))
            .await
            .unwrap();

        let found = store
            .find_one(COLLECTION, &Filter::new().eq("alias_id", "a"))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["_id"], "1");
        assert_eq!(store.len(COLLECTION), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryDocumentStore::new();
        store.insert_one(COLLECTION, doc(json!({"_id": "1"}))).await.unwrap();

        let err = store
            .insert_one(COLLECTION, doc(json!({"_id": "1"})))
            .await
            .unwrap_err();
        match err {
            StoreError::DuplicateKey(conflict) => {
                assert_eq!(conflict.index.as_deref(), Some("_id_"));
                assert_eq!(conflict.key_value("_id"), Some("1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_id_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = store.insert_one(COLLECTION, doc(json!({"a": 1}))).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_partial_unique_index() {
        let store = InMemoryDocumentStore::new();
        store.ensure_indexes(COLLECTION, &[primary_index()]).await.unwrap();

        let link = |id: &str, link_type: &str, deleted: Option<&str>| {
            doc(json!({"_id": id, "alias_id": "a", "link_type": link_type, "deleted_at": deleted}))
        };

        store.insert_one(COLLECTION, link("1", "PRIMARY_HOLDER", None)).await.unwrap();
        // Not covered: other link type
        store.insert_one(COLLECTION, link("2", "RESPONSIBLE_PARTY", None)).await.unwrap();
        // Not covered: soft-deleted
        store
            .insert_one(COLLECTION, link("3", "PRIMARY_HOLDER", Some("2024-01-01T00:00:00Z")))
            .await
            .unwrap();

        let err = store
            .insert_one(COLLECTION, link("4", "PRIMARY_HOLDER", None))
            .await
            .unwrap_err();
        match err {
            StoreError::DuplicateKey(conflict) => {
                assert_eq!(conflict.index.as_deref(), Some("one_primary"));
                assert_eq!(conflict.key_value("alias_id"), Some("a"));
                assert!(conflict.message.contains("one_primary"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_frees_unique_key() {
        let store = InMemoryDocumentStore::new();
        store.ensure_indexes(COLLECTION, &[primary_index()]).await.unwrap();
        store
            .insert_one(
                COLLECTION,
                doc(json!({"_id": "1", "alias_id": "a", "link_type": "PRIMARY_HOLDER", "deleted_at": null})),
            )
            .await
            .unwrap();

        let mut update = UpdateDocument::new();
        update.set("deleted_at", "2024-01-01T00:00:00Z");
        let matched = store
            .update_one(COLLECTION, &Filter::new().eq("_id", "1"), &update)
            .await
            .unwrap();
        assert_eq!(matched, 1);

        store
            .insert_one(
                COLLECTION,
                doc(json!({"_id": "2", "alias_id": "a", "link_type": "PRIMARY_HOLDER", "deleted_at": null})),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_checks_unique_indexes() {
        let store = InMemoryDocumentStore::new();
        let index = IndexSpec::new("unique_account", &["account_id"]).unique();
        store.ensure_indexes("aliases_org", &[index]).await.unwrap();
        store
            .insert_one("aliases_org", doc(json!({"_id": "1", "account_id": "x"})))
            .await
            .unwrap();
        store
            .insert_one("aliases_org", doc(json!({"_id": "2", "account_id": "y"})))
            .await
            .unwrap();

        // Updating a document onto its own key is fine
        let mut same = UpdateDocument::new();
        same.set("account_id", "x");
        assert_eq!(
            store
                .update_one("aliases_org", &Filter::new().eq("_id", "1"), &same)
                .await
                .unwrap(),
            1
        );

        let mut clash = UpdateDocument::new();
        clash.set("account_id", "x");
        let err = store
            .update_one("aliases_org", &Filter::new().eq("_id", "2"), &clash)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_unmatched() {
        let store = InMemoryDocumentStore::new();
        let mut update = UpdateDocument::new();
        update.set("a", 1);

        assert_eq!(store.update_one("none", &Filter::new(), &update).await.unwrap(), 0);
        assert_eq!(store.delete_one("none", &Filter::new()).await.unwrap(), 0);
        assert_eq!(store.count("none", &Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_sorts_and_paginates() {
        let store = InMemoryDocumentStore::new();
        for (id, created) in [
            ("b", "2024-01-02T00:00:00Z"),
            ("a", "2024-01-01T00:00:00Z"),
            ("c", "2024-01-03T00:00:00.5Z"),
        ] {
            store
                .insert_one(COLLECTION, doc(json!({"_id": id, "created_at": created})))
                .await
                .unwrap();
        }

        let ids = |docs: Vec<Document>| -> Vec<String> {
            docs.iter().map(|d| d["_id"].as_str().unwrap().to_string()).collect()
        };

        let asc = store
            .find(COLLECTION, &Filter::new(), &FindOptions::paginated(&Pagination::new(1, 2)))
            .await
            .unwrap();
        assert_eq!(ids(asc), vec!["a", "b"]);

        let page_two = store
            .find(COLLECTION, &Filter::new(), &FindOptions::paginated(&Pagination::new(2, 2)))
            .await
            .unwrap();
        assert_eq!(ids(page_two), vec!["c"]);

        let desc = store
            .find(
                COLLECTION,
                &Filter::new(),
                &FindOptions::paginated(&Pagination::new(1, 10).descending()),
            )
            .await
            .unwrap();
        assert_eq!(ids(desc), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_array_field_filter() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(
                "aliases_org",
                doc(json!({"_id": "1", "search": {"related_party_documents": ["t1", "t2"]}})),
            )
            .await
            .unwrap();

        let filter = Filter::new().eq("search.related_party_documents", "t2");
        assert_eq!(store.count("aliases_org", &filter).await.unwrap(), 1);

        let filter = Filter::new().eq("search.related_party_documents", "t3");
        assert_eq!(store.count("aliases_org", &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ensure_indexes_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store.ensure_indexes(COLLECTION, &[primary_index()]).await.unwrap();
        store.ensure_indexes(COLLECTION, &[primary_index()]).await.unwrap();
        assert_eq!(store.index_names(COLLECTION), vec!["one_primary".to_string()]);
    }
}
