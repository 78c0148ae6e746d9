//! Index declarations per collection.
//!
//! Every unique index is partial on `deleted_at` being null, so a
//! soft-deleted document frees its key. Order matters: the store reports
//! the first violated index, and the primary-holder rule must win over the
//! generic `(alias_id, link_type)` rule.

use crate::domain::LinkType;
use crate::ports::{Filter, IndexSpec, DELETED_AT_FIELD};

/// At most one active PRIMARY_HOLDER link per alias.
pub const HOLDER_LINK_PRIMARY_HOLDER_INDEX: &str = "holder_link_unique_primary_holder";
/// At most one active link per `(alias_id, link_type)`.
pub const HOLDER_LINK_ALIAS_LINK_TYPE_INDEX: &str = "holder_link_unique_alias_link_type";
/// At most one active alias per account id.
pub const ALIAS_ACCOUNT_ID_INDEX: &str = "alias_unique_account_id";
/// At most one active alias per `(ledger_id, account_id)`.
pub const ALIAS_LEDGER_ACCOUNT_INDEX: &str = "alias_unique_ledger_account";
/// At most one active alias per `(_id, holder_id)`.
pub const ALIAS_ID_HOLDER_INDEX: &str = "alias_unique_id_holder";
/// Primary key index reported by the store.
pub const PRIMARY_KEY_INDEX: &str = "_id_";

fn active() -> Filter {
    Filter::new().is_null(DELETED_AT_FIELD)
}

/// Holder collection indexes.
pub fn holder_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new("holder_external_id", &["external_id"]),
        IndexSpec::new("holder_search_document", &["search.document"]),
    ]
}

/// Alias collection indexes.
pub fn alias_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new(ALIAS_ACCOUNT_ID_INDEX, &["account_id"])
            .unique()
            .partial(active()),
        IndexSpec::new(ALIAS_LEDGER_ACCOUNT_INDEX, &["ledger_id", "account_id"])
            .unique()
            .partial(active()),
        IndexSpec::new(ALIAS_ID_HOLDER_INDEX, &["_id", "holder_id"])
            .unique()
            .partial(active()),
        IndexSpec::new("alias_holder_id", &["holder_id"]),
        IndexSpec::new("alias_ledger_id", &["ledger_id"]),
        IndexSpec::new("alias_search_document", &["search.document"]),
        IndexSpec::new("alias_search_account", &["search.banking_details_account"]),
        IndexSpec::new("alias_search_iban", &["search.banking_details_iban"]),
        IndexSpec::new(
            "alias_search_participant_document",
            &["search.regulatory_fields_participant_document"],
        ),
        IndexSpec::new(
            "alias_search_related_party_documents",
            &["search.related_party_documents"],
        ),
    ]
}

/// HolderLink collection indexes.
pub fn holder_link_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new(HOLDER_LINK_PRIMARY_HOLDER_INDEX, &["alias_id"])
            .unique()
            .partial(active().eq("link_type", LinkType::PrimaryHolder.as_str())),
        IndexSpec::new(HOLDER_LINK_ALIAS_LINK_TYPE_INDEX, &["alias_id", "link_type"])
            .unique()
            .partial(active()),
        IndexSpec::new("holder_link_holder_id", &["holder_id"]),
        IndexSpec::new("holder_link_alias_id", &["alias_id"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> crate::ports::Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_primary_index_declared_first() {
        let indexes = holder_link_indexes();
        assert_eq!(indexes[0].name, HOLDER_LINK_PRIMARY_HOLDER_INDEX);
        assert_eq!(indexes[1].name, HOLDER_LINK_ALIAS_LINK_TYPE_INDEX);
    }

    #[test]
    fn test_primary_index_covers_only_active_primary_links() {
        let index = &holder_link_indexes()[0];

        assert!(index.covers(&doc(json!({"link_type": "PRIMARY_HOLDER", "deleted_at": null}))));
        assert!(!index.covers(&doc(json!({"link_type": "RESPONSIBLE_PARTY", "deleted_at": null}))));
        assert!(!index.covers(&doc(
            json!({"link_type": "PRIMARY_HOLDER", "deleted_at": "2024-01-01T00:00:00Z"})
        )));
    }

    #[test]
    fn test_unique_indexes_are_partial() {
        for index in alias_indexes().iter().chain(holder_link_indexes().iter()) {
            if index.unique {
                assert!(index.partial.is_some(), "{} is not partial", index.name);
            }
        }
        assert!(holder_indexes().iter().all(|i| !i.unique));
    }
}
