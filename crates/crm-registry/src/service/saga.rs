//! # Alias/HolderLink Write Saga
//!
//! Alias creation with a link request spans two collections. Each completed
//! write records its undo action; on failure the log is unwound in reverse
//! and the original error is returned.
//!
//! ```text
//! ValidateLinkType -> PersistAlias -> ValidateConstraints
//!                  -> CreateHolderLink -> AttachHolderLink -> Enrich
//! ```
//!
//! Compensations are idempotent hard deletes. A compensation that fails is
//! logged and counted; it never replaces the error that triggered it.

use std::fmt;

use crm_telemetry::{metric_inc, SAGA_COMPENSATIONS};
use shared_types::{Metadata, OrganizationId};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::RegistryService;
use crate::domain::{
    validate_fields_to_remove, validate_related_party, validate_update_alias, Alias, AliasUpdate,
    HolderLink, LinkType, RegistryError, RelatedParty, RelatedPartyInput, UpdateAliasInput,
};
use crate::ports::{AliasRepository, HolderLinkRepository};

/// Saga steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStep {
    /// Input and link type checks.
    ValidateLinkType,
    /// Alias insert.
    PersistAlias,
    /// Link uniqueness pre-check.
    ValidateConstraints,
    /// HolderLink insert.
    CreateHolderLink,
    /// Alias touch after the link exists.
    AttachHolderLink,
    /// Read back with links.
    Enrich,
}

impl SagaStep {
    /// Stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateLinkType => "validate_link_type",
            Self::PersistAlias => "persist_alias",
            Self::ValidateConstraints => "validate_constraints",
            Self::CreateHolderLink => "create_holder_link",
            Self::AttachHolderLink => "attach_holder_link",
            Self::Enrich => "enrich",
        }
    }
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Undo action for a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Remove an Alias written by the saga.
    HardDeleteAlias {
        /// Owning Holder
        holder_id: Uuid,
        /// Alias to remove
        alias_id: Uuid,
    },
    /// Remove a HolderLink written by the saga.
    HardDeleteHolderLink {
        /// Link to remove
        link_id: Uuid,
    },
}

impl Compensation {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::HardDeleteAlias { .. } => "hard_delete_alias",
            Self::HardDeleteHolderLink { .. } => "hard_delete_holder_link",
        }
    }

    async fn apply(
        &self,
        org: &OrganizationId,
        aliases: &dyn AliasRepository,
        holder_links: &dyn HolderLinkRepository,
    ) -> Result<(), RegistryError> {
        let result = match self {
            Self::HardDeleteAlias {
                holder_id,
                alias_id,
            } => aliases.delete(org, *holder_id, *alias_id, true).await,
            Self::HardDeleteHolderLink { link_id } => {
                holder_links.delete(org, *link_id, true).await
            }
        };

        // Already gone counts as undone.
        match result {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

/// Completed writes of one saga run.
#[derive(Debug)]
pub struct CompensationLog {
    org: OrganizationId,
    entries: Vec<Compensation>,
}

impl CompensationLog {
    /// Empty log for a tenant.
    pub fn new(org: OrganizationId) -> Self {
        Self {
            org,
            entries: Vec::new(),
        }
    }

    /// Record the undo action of a write that just succeeded.
    pub fn record(&mut self, compensation: Compensation) {
        self.entries.push(compensation);
    }

    /// Recorded actions, oldest first.
    pub fn entries(&self) -> &[Compensation] {
        &self.entries
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every compensation, newest first. Returns the number that failed.
    pub async fn unwind(
        self,
        failed_at: SagaStep,
        aliases: &dyn AliasRepository,
        holder_links: &dyn HolderLinkRepository,
    ) -> usize {
        let mut failures = 0;

        for compensation in self.entries.iter().rev() {
            match compensation.apply(&self.org, aliases, holder_links).await {
                Ok(()) => {
                    metric_inc!(SAGA_COMPENSATIONS, &[compensation.label(), "ok"]);
                    info!(
                        "[crm-registry] Compensated {:?} after {} failure",
                        compensation, failed_at
                    );
                }
                Err(e) => {
                    failures += 1;
                    metric_inc!(SAGA_COMPENSATIONS, &[compensation.label(), "failed"]);
                    error!(
                        "[crm-registry] Compensation {:?} failed after {} failure: {}",
                        compensation, failed_at, e
                    );
                }
            }
        }

        failures
    }
}

impl RegistryService {
    /// Undo `log` and hand back the error that aborted the saga.
    async fn abort(
        &self,
        log: CompensationLog,
        step: SagaStep,
        err: RegistryError,
    ) -> RegistryError {
        warn!("[crm-registry] Saga failed at {}: {}", step, err);
        let failures = log
            .unwind(step, self.aliases.as_ref(), self.holder_links.as_ref())
            .await;
        if failures > 0 {
            error!(
                "[crm-registry] {} compensations failed, manual cleanup required",
                failures
            );
        }
        err
    }

    /// Persist an Alias and its HolderLink, or neither.
    pub(crate) async fn create_alias_with_link(
        &self,
        org: &OrganizationId,
        alias: Alias,
        link_type: LinkType,
    ) -> Result<Alias, RegistryError> {
        let mut log = CompensationLog::new(org.clone());

        let created = self
            .aliases
            .create(org, &alias)
            .await
            .map_err(|e| self.constraints.classify_alias_conflict(e))?;
        log.record(Compensation::HardDeleteAlias {
            holder_id: created.holder_id,
            alias_id: created.id,
        });

        if let Err(err) = self.constraints.validate(org, created.id, link_type).await {
            return Err(self.abort(log, SagaStep::ValidateConstraints, err).await);
        }

        let link = HolderLink::new(created.holder_id, created.id, link_type, Metadata::new());
        let link = match self.holder_links.create(org, &link).await {
            Ok(link) => link,
            Err(err) => {
                let err = self
                    .constraints
                    .classify_write_conflict(err, created.id, link_type);
                return Err(self.abort(log, SagaStep::CreateHolderLink, err).await);
            }
        };
        log.record(Compensation::HardDeleteHolderLink { link_id: link.id });

        let attached = match self
            .aliases
            .update(org, created.holder_id, created.id, &AliasUpdate::default(), &[])
            .await
        {
            Ok(alias) => alias,
            Err(err) => return Err(self.abort(log, SagaStep::AttachHolderLink, err).await),
        };

        info!(
            "[crm-registry] Alias {} created with {} link {}",
            attached.id, link_type, link.id
        );

        // Both records are durable from here; a failed read is not undone.
        self.enrich(org, attached).await
    }

    /// Apply an Alias update, attaching a HolderLink when requested.
    pub(crate) async fn update_alias_with_link(
        &self,
        org: &OrganizationId,
        holder_id: Uuid,
        alias_id: Uuid,
        input: UpdateAliasInput,
        fields_to_remove: Vec<String>,
    ) -> Result<Alias, RegistryError> {
        let link_type = validate_update_alias(&input)?;
        validate_fields_to_remove(&fields_to_remove)?;

        let existing = self.aliases.find(org, Some(holder_id), alias_id, false).await?;

        let related_parties = if input.related_parties.is_empty() {
            None
        } else {
            let mut parties = existing.related_parties;
            parties.extend(new_related_parties(input.related_parties)?);
            Some(parties)
        };
        let update = AliasUpdate {
            alias_type: input.alias_type,
            banking_details: input.banking_details,
            regulatory_fields: input.regulatory_fields,
            related_parties,
            metadata: input.metadata,
        };

        let Some(link_type) = link_type else {
            let updated = self
                .aliases
                .update(org, holder_id, alias_id, &update, &fields_to_remove)
                .await?;
            return self.enrich(org, updated).await;
        };

        self.constraints.validate(org, alias_id, link_type).await?;

        let mut log = CompensationLog::new(org.clone());
        let link = HolderLink::new(holder_id, alias_id, link_type, Metadata::new());
        let link = self
            .holder_links
            .create(org, &link)
            .await
            .map_err(|e| self.constraints.classify_write_conflict(e, alias_id, link_type))?;
        log.record(Compensation::HardDeleteHolderLink { link_id: link.id });

        let updated = match self
            .aliases
            .update(org, holder_id, alias_id, &update, &fields_to_remove)
            .await
        {
            Ok(alias) => alias,
            Err(err) => return Err(self.abort(log, SagaStep::AttachHolderLink, err).await),
        };

        info!(
            "[crm-registry] Alias {} updated with {} link {}",
            alias_id, link_type, link.id
        );
        self.enrich(org, updated).await
    }
}

/// Validate caller-supplied parties and assign fresh ids.
pub(crate) fn new_related_parties(
    inputs: Vec<RelatedPartyInput>,
) -> Result<Vec<RelatedParty>, RegistryError> {
    inputs
        .into_iter()
        .map(|input| {
            let role = validate_related_party(&input)?;
            Ok(input.into_related_party(role))
        })
        .collect()
}
