//! HolderLink constraint engine.
//!
//! Two layers enforce the same two rules:
//! 1. A pre-check lookup before the write, for a precise error.
//! 2. The partial unique indexes, which close the race between concurrent
//!    writers. Their violations are translated back to the same errors.

use std::sync::Arc;

use crm_telemetry::{metric_inc, CONSTRAINT_VIOLATIONS};
use shared_types::OrganizationId;
use tracing::{debug, warn};
use uuid::Uuid;

use super::indexes::{
    ALIAS_ACCOUNT_ID_INDEX, ALIAS_ID_HOLDER_INDEX, ALIAS_LEDGER_ACCOUNT_INDEX,
    HOLDER_LINK_ALIAS_LINK_TYPE_INDEX, HOLDER_LINK_PRIMARY_HOLDER_INDEX, PRIMARY_KEY_INDEX,
};
use crate::domain::{EntityKind, LinkType, RegistryError, StoreConflict};
use crate::ports::HolderLinkRepository;

const PRIMARY_HOLDER_CONSTRAINT: &str = "primary_holder";
const ALIAS_LINK_TYPE_CONSTRAINT: &str = "alias_link_type";

/// Enforces link uniqueness and classifies unique-index violations.
#[derive(Clone)]
pub struct ConstraintEngine {
    holder_links: Arc<dyn HolderLinkRepository>,
}

impl ConstraintEngine {
    /// Create an engine reading through `holder_links`.
    pub fn new(holder_links: Arc<dyn HolderLinkRepository>) -> Self {
        Self { holder_links }
    }

    /// Refuse a link that would duplicate an active `(alias_id, link_type)`.
    ///
    /// A duplicate PRIMARY_HOLDER reports [`RegistryError::PrimaryHolderAlreadyExists`],
    /// any other duplicate [`RegistryError::DuplicateHolderLink`].
    pub async fn validate(
        &self,
        org: &OrganizationId,
        alias_id: Uuid,
        link_type: LinkType,
    ) -> Result<(), RegistryError> {
        let existing = self
            .holder_links
            .find_by_alias_id_and_link_type(org, alias_id, link_type)
            .await?;

        match existing {
            None => {
                debug!("[crm-registry] Link {} is free on alias {}", link_type, alias_id);
                Ok(())
            }
            Some(link) => {
                warn!(
                    "[crm-registry] Alias {} already has {} link {}",
                    alias_id, link_type, link.id
                );
                Err(violation(alias_id, link_type, "pre_check"))
            }
        }
    }

    /// Translate a HolderLink unique-index violation into the business error.
    ///
    /// Resolution order: index name, then key fields, then the raw store
    /// message. Anything unrecognised is returned unchanged.
    pub fn classify_write_conflict(
        &self,
        err: RegistryError,
        alias_id: Uuid,
        link_type: LinkType,
    ) -> RegistryError {
        let conflict = match &err {
            RegistryError::UniqueViolation {
                entity: EntityKind::HolderLink,
                conflict,
            } => conflict,
            _ => return err,
        };

        match classify_link_conflict(conflict) {
            Some(ConflictClass::PrimaryHolder) => {
                violation(alias_id, LinkType::PrimaryHolder, "index")
            }
            Some(ConflictClass::AliasLinkType) => violation(alias_id, link_type, "index"),
            None => {
                warn!(
                    "[crm-registry] Unclassified holder link conflict: {}",
                    conflict.message
                );
                err
            }
        }
    }

    /// Translate an Alias unique-index violation into the business error.
    pub fn classify_alias_conflict(&self, err: RegistryError) -> RegistryError {
        let conflict = match &err {
            RegistryError::UniqueViolation {
                entity: EntityKind::Alias,
                conflict,
            } => conflict,
            _ => return err,
        };

        let account_id = || conflict.key_value("account_id").unwrap_or_default().to_string();
        let alias_id = || conflict.key_value("_id").unwrap_or_default().to_string();

        match conflict.index.as_deref() {
            Some(ALIAS_ACCOUNT_ID_INDEX) | Some(ALIAS_LEDGER_ACCOUNT_INDEX) => {
                return RegistryError::AccountIdAlreadyExists {
                    account_id: account_id(),
                }
            }
            Some(PRIMARY_KEY_INDEX) | Some(ALIAS_ID_HOLDER_INDEX) => {
                return RegistryError::AliasAlreadyExists {
                    alias_id: alias_id(),
                }
            }
            _ => {}
        }

        if conflict.has_key("account_id") {
            RegistryError::AccountIdAlreadyExists {
                account_id: account_id(),
            }
        } else if conflict.has_key("_id") {
            RegistryError::AliasAlreadyExists {
                alias_id: alias_id(),
            }
        } else if conflict.message.contains("account_id") {
            RegistryError::AccountIdAlreadyExists {
                account_id: String::new(),
            }
        } else {
            err
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictClass {
    PrimaryHolder,
    AliasLinkType,
}

fn classify_link_conflict(conflict: &StoreConflict) -> Option<ConflictClass> {
    let primary = LinkType::PrimaryHolder.as_str();

    match conflict.index.as_deref() {
        Some(HOLDER_LINK_PRIMARY_HOLDER_INDEX) => return Some(ConflictClass::PrimaryHolder),
        Some(HOLDER_LINK_ALIAS_LINK_TYPE_INDEX) => {
            return Some(if conflict.key_value("link_type") == Some(primary) {
                ConflictClass::PrimaryHolder
            } else {
                ConflictClass::AliasLinkType
            })
        }
        _ => {}
    }

    if conflict.has_key("alias_id") {
        return Some(match conflict.key_value("link_type") {
            None => ConflictClass::PrimaryHolder,
            Some(value) if value == primary => ConflictClass::PrimaryHolder,
            Some(_) => ConflictClass::AliasLinkType,
        });
    }

    // Last resort: stores that only report a message.
    let message = conflict.message.as_str();
    if message.contains(HOLDER_LINK_PRIMARY_HOLDER_INDEX) || message.contains(primary) {
        Some(ConflictClass::PrimaryHolder)
    } else if message.contains(HOLDER_LINK_ALIAS_LINK_TYPE_INDEX) {
        Some(ConflictClass::AliasLinkType)
    } else {
        None
    }
}

fn violation(alias_id: Uuid, link_type: LinkType, layer: &str) -> RegistryError {
    if link_type.is_primary() {
        metric_inc!(CONSTRAINT_VIOLATIONS, &[PRIMARY_HOLDER_CONSTRAINT, layer]);
        RegistryError::PrimaryHolderAlreadyExists { alias_id }
    } else {
        metric_inc!(CONSTRAINT_VIOLATIONS, &[ALIAS_LINK_TYPE_CONSTRAINT, layer]);
        RegistryError::DuplicateHolderLink {
            alias_id,
            link_type,
        }
    }
}
