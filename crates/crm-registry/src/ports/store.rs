//! # Document Store Types
//!
//! Filters, index declarations and update documents understood by every
//! [`DocumentStore`](super::outbound::DocumentStore) implementation.
//!
//! Paths are dotted (`search.document`, `metadata.segment`). A path that
//! resolves to an array matches an equality condition when any element is
//! equal to the value.

use serde_json::{Map, Value};
use shared_types::{Pagination, SortOrder};
use uuid::Uuid;

/// A stored JSON document keyed by `_id`.
pub type Document = Map<String, Value>;

/// Primary key field.
pub const ID_FIELD: &str = "_id";

/// Soft-delete marker field.
pub const DELETED_AT_FIELD: &str = "deleted_at";

/// Resolve a dotted path inside a document.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// One filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Path equals value (or contains it, for arrays).
    Eq(String, Value),
    /// Path absent or null.
    IsNull(String),
    /// Path present and not null.
    NotNull(String),
}

impl Condition {
    fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq(path, expected) => match lookup(document, path) {
                Some(Value::Array(items)) if !expected.is_array() => {
                    items.iter().any(|item| item == expected)
                }
                Some(actual) => actual == expected,
                None => expected.is_null(),
            },
            Self::IsNull(path) => matches!(lookup(document, path), None | Some(Value::Null)),
            Self::NotNull(path) => !matches!(lookup(document, path), None | Some(Value::Null)),
        }
    }
}

/// Conjunction of conditions. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Match-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on `_id`.
    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq(ID_FIELD, id.to_string())
    }

    /// Add an equality condition.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(path.into(), value.into()));
        self
    }

    /// Add an equality condition when `value` is present.
    pub fn eq_opt(self, path: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.eq(path, value),
            None => self,
        }
    }

    /// Add an absent-or-null condition.
    pub fn is_null(mut self, path: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull(path.into()));
        self
    }

    /// Add a present-and-not-null condition.
    pub fn not_null(mut self, path: impl Into<String>) -> Self {
        self.conditions.push(Condition::NotNull(path.into()));
        self
    }

    /// Exclude soft-deleted documents unless `include_deleted`.
    pub fn active_unless(self, include_deleted: bool) -> Self {
        if include_deleted {
            self
        } else {
            self.is_null(DELETED_AT_FIELD)
        }
    }

    /// The conditions of this filter.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate against a document.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }
}

/// Index declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Index name, reported back on unique violations.
    pub name: String,
    /// Indexed paths, in order.
    pub keys: Vec<String>,
    /// Reject a second document with the same key.
    pub unique: bool,
    /// Only documents matching this filter are covered.
    pub partial: Option<Filter>,
}

impl IndexSpec {
    /// Non-unique index.
    pub fn new(name: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            unique: false,
            partial: None,
        }
    }

    /// Make the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Restrict the index to documents matching `filter`.
    pub fn partial(mut self, filter: Filter) -> Self {
        self.partial = Some(filter);
        self
    }

    /// True when `document` is covered by this index.
    pub fn covers(&self, document: &Document) -> bool {
        self.partial.as_ref().map_or(true, |f| f.matches(document))
    }
}

/// Options for multi-document reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Documents to skip.
    pub skip: u64,
    /// Maximum documents to return.
    pub limit: Option<u64>,
    /// Sort path and direction.
    pub sort: Option<(String, SortOrder)>,
}

impl FindOptions {
    /// Page of results ordered by `created_at`.
    pub fn paginated(pagination: &Pagination) -> Self {
        Self {
            skip: pagination.offset(),
            limit: Some(u64::from(pagination.limit)),
            sort: Some(("created_at".to_string(), pagination.sort_order)),
        }
    }
}

/// Partial update: paths to set, then paths to unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDocument {
    /// `(path, value)` assignments.
    pub set: Vec<(String, Value)>,
    /// Paths removed after assignments.
    pub unset: Vec<String>,
}

impl UpdateDocument {
    /// Empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` at `path`.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.set.push((path.into(), value.into()));
        self
    }

    /// Remove `path`.
    pub fn unset(&mut self, path: impl Into<String>) -> &mut Self {
        self.unset.push(path.into());
        self
    }

    /// Value assigned to `path`, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.set.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    /// True when nothing is set or unset.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply to a document in place.
    ///
    /// Missing or non-object intermediate segments are replaced by objects.
    pub fn apply_to(&self, document: &mut Document) {
        for (path, value) in &self.set {
            set_path(document, path, value.clone());
        }
        for path in &self.unset {
            unset_path(document, path);
        }
    }
}

fn set_path(document: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            document.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, value);
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(map)) = document.get_mut(head) {
                unset_path(map, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_lookup_dotted_path() {
        let d = doc(json!({"search": {"document": "abc"}}));
        assert_eq!(lookup(&d, "search.document"), Some(&json!("abc")));
        assert_eq!(lookup(&d, "search.missing"), None);
    }

    #[test]
    fn test_eq_matches_array_element() {
        let d = doc(json!({"search": {"related_party_documents": ["t1", "t2"]}}));
        assert!(Filter::new()
            .eq("search.related_party_documents", "t2")
            .matches(&d));
        assert!(!Filter::new()
            .eq("search.related_party_documents", "t3")
            .matches(&d));
    }

    #[test]
    fn test_is_null_matches_absent_and_null() {
        let absent = doc(json!({"_id": "1"}));
        let null = doc(json!({"_id": "1", "deleted_at": null}));
        let set = doc(json!({"_id": "1", "deleted_at": "2024-01-01T00:00:00Z"}));

        let filter = Filter::new().active_unless(false);
        assert!(filter.matches(&absent));
        assert!(filter.matches(&null));
        assert!(!filter.matches(&set));
        assert!(Filter::new().not_null("deleted_at").matches(&set));
    }

    #[test]
    fn test_update_sets_nested_path_through_null() {
        let mut d = doc(json!({"banking_details": null}));
        let mut update = UpdateDocument::new();
        update.set("banking_details.branch", "0001");
        update.apply_to(&mut d);

        assert_eq!(lookup(&d, "banking_details.branch"), Some(&json!("0001")));
    }

    #[test]
    fn test_update_unsets_metadata_key() {
        let mut d = doc(json!({"metadata": {"a": 1, "b": 2}}));
        let mut update = UpdateDocument::new();
        update.set("metadata.c", 3).unset("metadata.a");
        update.apply_to(&mut d);

        assert_eq!(d["metadata"], json!({"b": 2, "c": 3}));
    }

    #[test]
    fn test_partial_index_coverage() {
        let index = IndexSpec::new("ix", &["alias_id"])
            .unique()
            .partial(Filter::new().eq("link_type", "PRIMARY_HOLDER"));

        assert!(index.covers(&doc(json!({"link_type": "PRIMARY_HOLDER"}))));
        assert!(!index.covers(&doc(json!({"link_type": "RESPONSIBLE_PARTY"}))));
    }
}
