//! End-to-end registry flows over the in-memory store.
//!
//! Covers the write saga, link constraints under races, the deletion
//! cascade, encrypted search and tenant isolation.

use std::sync::Arc;

use chrono::NaiveDate;
use crm_registry::adapters::{HOLDER_COLLECTION, ALIAS_COLLECTION};
use crm_registry::{
    AliasApi, AliasQuery, BankingDetails, CipherFieldCodec, CreateAliasInput, CreateHolderInput,
    CreateHolderLinkInput, ErrorKind, HolderApi, HolderLinkApi, HolderLinkQuery, HolderQuery,
    HolderUpdate, InMemoryDocumentStore, LinkType, RegistryConfig, RegistryError,
    RegistryService, RelatedPartyInput, UpdateAliasInput,
};
use shared_types::{Metadata, MetadataError, MetadataQuery, OrganizationId, Pagination};
use uuid::Uuid;

// =============================================================================
// Helpers
// =============================================================================

fn org() -> OrganizationId {
    OrganizationId::new("org-1").unwrap()
}

fn service() -> RegistryService {
    RegistryService::in_memory(RegistryConfig::for_testing()).unwrap()
}

fn service_with_store() -> (RegistryService, Arc<InMemoryDocumentStore>) {
    let config = RegistryConfig::for_testing();
    let store = Arc::new(InMemoryDocumentStore::new());
    let codec = Arc::new(CipherFieldCodec::from_config(&config.crypto).unwrap());
    (
        RegistryService::with_document_store(store.clone(), codec, config),
        store,
    )
}

async fn holder(service: &RegistryService, name: &str, document: &str) -> Uuid {
    service
        .create_holder(&org(), CreateHolderInput::natural_person(name, document))
        .await
        .unwrap()
        .id
}

fn party(document: &str, role: &str) -> RelatedPartyInput {
    RelatedPartyInput {
        document: document.to_string(),
        name: "Maria Souza".to_string(),
        role: role.to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: None,
    }
}

fn link_input(holder_id: Uuid, alias_id: Uuid, link_type: LinkType) -> CreateHolderLinkInput {
    CreateHolderLinkInput {
        holder_id,
        alias_id,
        link_type: link_type.as_str().to_string(),
        metadata: Metadata::new(),
    }
}

// =============================================================================
// Write saga
// =============================================================================

#[tokio::test]
async fn test_create_alias_with_primary_holder() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(
            &org(),
            holder_id,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    assert_eq!(alias.holder_id, holder_id);
    assert_eq!(alias.document, "12345678901");
    assert_eq!(alias.holder_links.len(), 1);
    assert_eq!(alias.holder_links[0].link_type, LinkType::PrimaryHolder);
    assert_eq!(alias.holder_links[0].holder_id, holder_id);
    assert_eq!(alias.holder_links[0].alias_id, alias.id);
}

#[tokio::test]
async fn test_create_alias_without_link() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(&org(), holder_id, CreateAliasInput::new("ledger-1", "acc-1"))
        .await
        .unwrap();

    assert!(alias.holder_links.is_empty());
}

#[tokio::test]
async fn test_create_alias_invalid_link_type_writes_nothing() {
    let (service, store) = service_with_store();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    let mut input = CreateAliasInput::new("ledger-1", "acc-1");
    input.link_type = Some("OWNER".to_string());

    let err = service.create_alias(&org(), holder_id, input).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidLinkType(_)));
    assert_eq!(store.len(&org().collection(ALIAS_COLLECTION)), 0);
}

#[tokio::test]
async fn test_create_alias_for_missing_holder() {
    let service = service();

    let err = service
        .create_alias(
            &org(),
            Uuid::new_v4(),
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_duplicate_account_id_across_ledgers() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    service
        .create_alias(
            &org(),
            holder_id,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    let err = service
        .create_alias(
            &org(),
            holder_id,
            CreateAliasInput::new("ledger-2", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap_err();

    match err {
        RegistryError::AccountIdAlreadyExists { account_id } => assert_eq!(account_id, "acc-1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_account_id_reusable_after_soft_delete() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    let first = service
        .create_alias(
            &org(),
            holder_id,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();
    service
        .delete_alias(&org(), holder_id, first.id, false)
        .await
        .unwrap();

    let second = service
        .create_alias(
            &org(),
            holder_id,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.holder_links.len(), 1);
}

// =============================================================================
// Link constraints
// =============================================================================

#[tokio::test]
async fn test_second_primary_holder_rejected() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;
    let other = holder(&service, "Jane Roe", "10987654321").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    let err = service
        .create_holder_link(&org(), link_input(other, alias.id, LinkType::PrimaryHolder))
        .await
        .unwrap_err();

    match err {
        RegistryError::PrimaryHolderAlreadyExists { alias_id } => assert_eq!(alias_id, alias.id),
        other => panic!("unexpected error: {other}"),
    }

    let current = service.get_alias(&org(), owner, alias.id, false).await.unwrap();
    assert_eq!(current.holder_links.len(), 1);
    assert_eq!(current.holder_links[0].holder_id, owner);
}

#[tokio::test]
async fn test_duplicate_link_type_rejected() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;
    let first = holder(&service, "Jane Roe", "10987654321").await;
    let second = holder(&service, "Rick Poe", "11122233344").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    service
        .create_holder_link(&org(), link_input(first, alias.id, LinkType::LegalRepresentative))
        .await
        .unwrap();

    let err = service
        .create_holder_link(&org(), link_input(second, alias.id, LinkType::LegalRepresentative))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::DuplicateHolderLink {
            link_type: LinkType::LegalRepresentative,
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_primary_links_single_winner() {
    let service = Arc::new(service());
    let owner = holder(&service, "John Doe", "12345678901").await;
    let a = holder(&service, "Jane Roe", "10987654321").await;
    let b = holder(&service, "Rick Poe", "11122233344").await;

    let alias = service
        .create_alias(&org(), owner, CreateAliasInput::new("ledger-1", "acc-1"))
        .await
        .unwrap();

    let first = {
        let service = service.clone();
        let alias_id = alias.id;
        tokio::spawn(async move {
            service
                .create_holder_link(&org(), link_input(a, alias_id, LinkType::PrimaryHolder))
                .await
        })
    };
    let second = {
        let service = service.clone();
        let alias_id = alias.id;
        tokio::spawn(async move {
            service
                .create_holder_link(&org(), link_input(b, alias_id, LinkType::PrimaryHolder))
                .await
        })
    };

    let (first, second) = tokio::join!(first, second);
    let results = [first.unwrap(), second.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(RegistryError::PrimaryHolderAlreadyExists { .. })
    )));

    let links = service
        .list_holder_links(
            &org(),
            HolderLinkQuery {
                alias_id: Some(alias.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_create_holder_link_requires_both_records() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let err = service
        .create_holder_link(&org(), link_input(owner, Uuid::new_v4(), LinkType::PrimaryHolder))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let alias = service
        .create_alias(&org(), owner, CreateAliasInput::new("ledger-1", "acc-1"))
        .await
        .unwrap();
    let err = service
        .create_holder_link(&org(), link_input(Uuid::new_v4(), alias.id, LinkType::PrimaryHolder))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_alias_attaches_link() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(&org(), owner, CreateAliasInput::new("ledger-1", "acc-1"))
        .await
        .unwrap();

    let updated = service
        .update_alias(
            &org(),
            owner,
            alias.id,
            UpdateAliasInput {
                link_type: Some("PRIMARY_HOLDER".to_string()),
                alias_type: Some("checking".to_string()),
                ..Default::default()
            },
            Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(updated.alias_type.as_deref(), Some("checking"));
    assert_eq!(updated.holder_links.len(), 1);
    assert_eq!(updated.holder_links[0].link_type, LinkType::PrimaryHolder);
}

#[tokio::test]
async fn test_related_parties_append_and_delete() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let mut input = CreateAliasInput::new("ledger-1", "acc-1");
    input.related_parties = vec![party("98765432100", "LEGAL_REPRESENTATIVE")];
    let alias = service.create_alias(&org(), owner, input).await.unwrap();
    assert_eq!(alias.related_parties.len(), 1);

    let updated = service
        .update_alias(
            &org(),
            owner,
            alias.id,
            UpdateAliasInput {
                related_parties: vec![party("55566677788", "RESPONSIBLE_PARTY")],
                ..Default::default()
            },
            Vec::new(),
        )
        .await
        .unwrap();
    assert_eq!(updated.related_parties.len(), 2);
    assert_eq!(updated.related_parties[0].id, alias.related_parties[0].id);
    assert_eq!(updated.related_parties[1].document, "55566677788");

    service
        .delete_related_party(&org(), owner, alias.id, alias.related_parties[0].id)
        .await
        .unwrap();
    let current = service.get_alias(&org(), owner, alias.id, false).await.unwrap();
    assert_eq!(current.related_parties.len(), 1);
    assert_eq!(current.related_parties[0].role, LinkType::ResponsibleParty);

    let err = service
        .delete_related_party(&org(), owner, alias.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::RelatedPartyNotFound { .. }));
}

#[tokio::test]
async fn test_holder_metadata_removal() {
    let service = service();
    let mut input = CreateHolderInput::natural_person("John Doe", "12345678901");
    input.metadata = Metadata::new().with("tier", "gold").with("segment", "retail");
    let created = service.create_holder(&org(), input).await.unwrap();

    let updated = service
        .update_holder(
            &org(),
            created.id,
            HolderUpdate {
                metadata: Some(Metadata::new().with("score", 700i64)),
                ..Default::default()
            },
            vec!["metadata.tier".to_string()],
        )
        .await
        .unwrap();

    assert!(!updated.metadata.contains_key("tier"));
    assert!(updated.metadata.contains_key("segment"));
    assert!(updated.metadata.contains_key("score"));
    assert_eq!(updated.document, "12345678901");
}

#[tokio::test]
async fn test_removal_outside_metadata_rejected() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;

    let err = service
        .update_holder(
            &org(),
            holder_id,
            HolderUpdate::default(),
            vec!["name".to_string()],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidMetadata(_)));
}

#[tokio::test]
async fn test_metadata_keys_with_path_characters_rejected() {
    let service = service();
    let mut input = CreateHolderInput::natural_person("John Doe", "12345678901");
    input.metadata = Metadata::new().with("tier.level", "gold");
    let err = service.create_holder(&org(), input).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidMetadata(MetadataError::ReservedCharacter { .. })
    ));

    let holder_id = holder(&service, "John Doe", "12345678901").await;
    let err = service
        .update_holder(
            &org(),
            holder_id,
            HolderUpdate {
                metadata: Some(Metadata::new().with("$set", "x")),
                ..Default::default()
            },
            Vec::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidMetadata(MetadataError::ReservedCharacter { .. })
    ));

    let stored = service.get_holder(&org(), holder_id, false).await.unwrap();
    assert!(stored.metadata.is_empty());
}

// =============================================================================
// Deletion cascade
// =============================================================================

#[tokio::test]
async fn test_soft_delete_alias_cascades_links() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;
    let representative = holder(&service, "Jane Roe", "10987654321").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();
    let extra = service
        .create_holder_link(
            &org(),
            link_input(representative, alias.id, LinkType::LegalRepresentative),
        )
        .await
        .unwrap();

    service
        .delete_alias(&org(), owner, alias.id, false)
        .await
        .unwrap();

    let err = service
        .get_alias(&org(), owner, alias.id, false)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let deleted = service.get_alias(&org(), owner, alias.id, true).await.unwrap();
    assert!(deleted.deleted_at.is_some());

    let link = service.get_holder_link(&org(), extra.id, true).await.unwrap();
    assert!(link.deleted_at.is_some());
    let primary = service
        .get_holder_link(&org(), alias.holder_links[0].id, true)
        .await
        .unwrap();
    assert!(primary.deleted_at.is_some());
}

#[tokio::test]
async fn test_hard_delete_alias_removes_records() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    service
        .delete_alias(&org(), owner, alias.id, true)
        .await
        .unwrap();

    assert!(service
        .get_alias(&org(), owner, alias.id, true)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(service
        .get_holder_link(&org(), alias.holder_links[0].id, true)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_delete_alias_without_links() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(&org(), owner, CreateAliasInput::new("ledger-1", "acc-1"))
        .await
        .unwrap();

    let err = service
        .delete_alias(&org(), owner, alias.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::HolderLinkNotFound { alias_id } if alias_id == alias.id));

    assert!(service.get_alias(&org(), owner, alias.id, false).await.is_ok());
}

#[tokio::test]
async fn test_delete_holder_with_aliases_refused() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();

    let err = service.delete_holder(&org(), owner, false).await.unwrap_err();
    assert!(matches!(err, RegistryError::HolderHasAliases { count: 1, .. }));

    let current = service.get_alias(&org(), owner, alias.id, false).await.unwrap();
    assert_eq!(current.holder_links.len(), 1);
    assert!(service.get_holder(&org(), owner, false).await.is_ok());
}

#[tokio::test]
async fn test_delete_holder_removes_its_links() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;
    let representative = holder(&service, "Jane Roe", "10987654321").await;

    let alias = service
        .create_alias(
            &org(),
            owner,
            CreateAliasInput::new("ledger-1", "acc-1").with_link_type(LinkType::PrimaryHolder),
        )
        .await
        .unwrap();
    service
        .create_holder_link(
            &org(),
            link_input(representative, alias.id, LinkType::LegalRepresentative),
        )
        .await
        .unwrap();

    service
        .delete_holder(&org(), representative, false)
        .await
        .unwrap();

    let current = service.get_alias(&org(), owner, alias.id, false).await.unwrap();
    assert_eq!(current.holder_links.len(), 1);
    assert_eq!(current.holder_links[0].link_type, LinkType::PrimaryHolder);
    assert!(service
        .get_holder(&org(), representative, false)
        .await
        .unwrap_err()
        .is_not_found());
}

// =============================================================================
// Encryption and search
// =============================================================================

#[tokio::test]
async fn test_sensitive_fields_encrypted_at_rest() {
    let (service, store) = service_with_store();
    holder(&service, "John Doe", "12345678901").await;

    let raw = serde_json::to_string(&store.dump(&org().collection(HOLDER_COLLECTION))).unwrap();
    assert!(!raw.contains("12345678901"));
    assert!(!raw.contains("John Doe"));
}

#[tokio::test]
async fn test_search_holder_by_document() {
    let service = service();
    let john = holder(&service, "John Doe", "12345678901").await;
    holder(&service, "Jane Roe", "10987654321").await;

    let found = service
        .list_holders(
            &org(),
            HolderQuery {
                document: Some("12345678901".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, john);
}

#[tokio::test]
async fn test_search_alias_by_banking_account() {
    let service = service();
    let owner = holder(&service, "John Doe", "12345678901").await;

    let mut input = CreateAliasInput::new("ledger-1", "acc-1");
    input.banking_details = Some(BankingDetails {
        branch: Some("0001".to_string()),
        account: Some("123450".to_string()),
        ..Default::default()
    });
    let alias = service.create_alias(&org(), owner, input).await.unwrap();
    service
        .create_alias(&org(), owner, CreateAliasInput::new("ledger-1", "acc-2"))
        .await
        .unwrap();

    let found = service
        .list_aliases(
            &org(),
            AliasQuery {
                banking_details_account: Some("123450".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, alias.id);
    assert_eq!(
        found[0]
            .banking_details
            .as_ref()
            .and_then(|d| d.account.as_deref()),
        Some("123450")
    );
}

#[tokio::test]
async fn test_list_holders_by_metadata() {
    let service = service();
    let mut input = CreateHolderInput::natural_person("John Doe", "12345678901");
    input.metadata = Metadata::new().with("tier", "gold");
    let gold = service.create_holder(&org(), input).await.unwrap();
    holder(&service, "Jane Roe", "10987654321").await;

    let found = service
        .list_holders(
            &org(),
            HolderQuery {
                metadata: MetadataQuery::new().with("tier", "gold"),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, gold.id);
}

#[tokio::test]
async fn test_invalid_pagination_rejected() {
    let service = service();

    for pagination in [Pagination::new(1, 0), Pagination::new(0, 10), Pagination::new(1, 101)] {
        let err = service
            .list_holders(
                &org(),
                HolderQuery {
                    pagination: Some(pagination),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidQueryParameter(_)));
    }
}

#[tokio::test]
async fn test_list_holder_links_rejects_unknown_type() {
    let service = service();

    let err = service
        .list_holder_links(
            &org(),
            HolderLinkQuery {
                link_type: Some("OWNER".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidLinkType(_)));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let service = service();
    let holder_id = holder(&service, "John Doe", "12345678901").await;
    let other = OrganizationId::new("org-2").unwrap();

    assert!(service
        .get_holder(&other, holder_id, true)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(service
        .list_holders(&other, HolderQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_tenants_differing_only_by_case_are_isolated() {
    let service = service();
    let upper = OrganizationId::new("Org-A").unwrap();
    let lower = OrganizationId::new("org-a").unwrap();

    let created = service
        .create_holder(
            &upper,
            CreateHolderInput::natural_person("John Doe", "12345678901"),
        )
        .await
        .unwrap();

    assert!(service
        .get_holder(&lower, created.id, true)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(service
        .list_holders(&lower, HolderQuery::default())
        .await
        .unwrap()
        .is_empty());

    // Each tenant lists only its own holder.
    service
        .create_holder(
            &lower,
            CreateHolderInput::natural_person("John Doe", "12345678901"),
        )
        .await
        .unwrap();
    assert_eq!(
        service
            .list_holders(&upper, HolderQuery::default())
            .await
            .unwrap()
            .len(),
        1
    );
}
