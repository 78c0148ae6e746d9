//! # Deletion Cascade
//!
//! Links go before the records they point at, so a partially failed cascade
//! never leaves a HolderLink referencing a deleted Alias or Holder.

use crm_telemetry::{log_event, metric_inc, CASCADE_DELETIONS};
use shared_types::OrganizationId;
use uuid::Uuid;

use super::{mode, RegistryService};
use crate::domain::{EntityKind, HolderLink, RegistryError};

impl RegistryService {
    /// Delete an Alias after all of its HolderLinks.
    ///
    /// Non-primary links are removed first and the primary link last. The
    /// first failure stops the cascade with the Alias still in place.
    pub(crate) async fn cascade_delete_alias(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        self.aliases
            .find(org, Some(holder_id), alias_id, false)
            .await?;

        let mut links = self
            .holder_links
            .find_by_alias_id(org, alias_id, false)
            .await?;
        if links.is_empty() {
            return Err(RegistryError::HolderLinkNotFound { alias_id });
        }
        deletion_order(&mut links);

        for link in &links {
            self.holder_links.delete(org, link.id, hard_delete).await?;
            metric_inc!(
                CASCADE_DELETIONS,
                &[EntityKind::HolderLink.as_str(), mode(hard_delete)]
            );
        }

        self.aliases
            .delete(org, holder_id, alias_id, hard_delete)
            .await?;
        metric_inc!(
            CASCADE_DELETIONS,
            &[EntityKind::Alias.as_str(), mode(hard_delete)]
        );

        log_event!(
            info,
            "cascade",
            "[crm-registry] Alias deleted with its links",
            alias_id = %alias_id,
            links = links.len(),
            mode = mode(hard_delete)
        );
        Ok(())
    }

    /// Delete a Holder after its HolderLinks. Refused while it owns active
    /// Aliases.
    ///
    /// Every link is attempted; the first failure is reported and the
    /// Holder is kept.
    pub(crate) async fn cascade_delete_holder(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        hard_delete: bool,
    ) -> Result<(), RegistryError> {
        self.holders.find(org, holder_id, false).await?;

        let count = self.aliases.count(org, holder_id).await?;
        if count > 0 {
            log_event!(
                warn,
                "cascade",
                "[crm-registry] Holder still owns aliases",
                holder_id = %holder_id,
                count = count
            );
            return Err(RegistryError::HolderHasAliases { holder_id, count });
        }

        let links = self
            .holder_links
            .find_by_holder_id(org, holder_id, false)
            .await?;

        let mut first_error = None;
        for link in &links {
            match self.holder_links.delete(org, link.id, hard_delete).await {
                Ok(()) => {
                    metric_inc!(
                        CASCADE_DELETIONS,
                        &[EntityKind::HolderLink.as_str(), mode(hard_delete)]
                    );
                }
                Err(e) => {
                    log_event!(
                        warn,
                        "cascade",
                        "[crm-registry] Failed to delete holder link",
                        link_id = %link.id,
                        holder_id = %holder_id,
                        error = %e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        self.holders.delete(org, holder_id, hard_delete).await?;
        metric_inc!(
            CASCADE_DELETIONS,
            &[EntityKind::Holder.as_str(), mode(hard_delete)]
        );

        log_event!(
            info,
            "cascade",
            "[crm-registry] Holder deleted with its links",
            holder_id = %holder_id,
            links = links.len(),
            mode = mode(hard_delete)
        );
        Ok(())
    }
}

/// Non-primary links first, the primary link last. Stable otherwise.
fn deletion_order(links: &mut [HolderLink]) {
    links.sort_by_key(|link| link.link_type.is_primary());
}
