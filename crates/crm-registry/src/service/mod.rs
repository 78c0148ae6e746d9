//! # Registry Service
//!
//! Application service implementing the Holder, Alias and HolderLink APIs.
//!
//! - `holder`, `alias`, `holder_link`: use cases per entity
//! - `saga`: Alias + HolderLink writes with compensating hard deletes
//! - `cascade`: link-first deletion of Aliases and Holders

mod alias;
mod cascade;
mod holder;
mod holder_link;
pub mod saga;

use std::sync::Arc;

use shared_types::{MetadataQuery, OrganizationId, Pagination};

use crate::adapters::{
    CipherFieldCodec, DocumentAliasRepository, DocumentHolderLinkRepository,
    DocumentHolderRepository, InMemoryDocumentStore,
};
use crate::config::{ConfigError, RegistryConfig};
use crate::constraints::ConstraintEngine;
use crate::domain::{validate_metadata_query, Alias, RegistryError};
use crate::ports::{
    AliasRepository, DocumentStore, FieldCodec, HolderLinkRepository, HolderRepository,
};

pub use saga::{Compensation, CompensationLog, SagaStep};

/// Registry Service - orchestrates repositories, constraints and sagas.
pub struct RegistryService {
    holders: Arc<dyn HolderRepository>,
    aliases: Arc<dyn AliasRepository>,
    holder_links: Arc<dyn HolderLinkRepository>,
    constraints: ConstraintEngine,
    config: RegistryConfig,
}

impl RegistryService {
    /// Create a service over explicit repositories.
    pub fn new(
        holders: Arc<dyn HolderRepository>,
        aliases: Arc<dyn AliasRepository>,
        holder_links: Arc<dyn HolderLinkRepository>,
        config: RegistryConfig,
    ) -> Self {
        if let Err(e) = crm_telemetry::register_metrics() {
            tracing::warn!("[crm-registry] Metrics registration failed: {}", e);
        }
        Self {
            holders,
            aliases,
            constraints: ConstraintEngine::new(holder_links.clone()),
            holder_links,
            config,
        }
    }

    /// Create a service with document repositories over one store.
    pub fn with_document_store(
        store: Arc<dyn DocumentStore>,
        codec: Arc<dyn FieldCodec>,
        config: RegistryConfig,
    ) -> Self {
        Self::new(
            Arc::new(DocumentHolderRepository::new(store.clone(), codec.clone())),
            Arc::new(DocumentAliasRepository::new(store.clone(), codec.clone())),
            Arc::new(DocumentHolderLinkRepository::new(store, codec)),
            config,
        )
    }

    /// Create a service over a fresh in-memory store.
    pub fn in_memory(config: RegistryConfig) -> Result<Self, ConfigError> {
        let codec = CipherFieldCodec::from_config(&config.crypto)?;
        Ok(Self::with_document_store(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(codec),
            config,
        ))
    }

    /// Active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Constraint engine shared by the use cases.
    pub fn constraints(&self) -> &ConstraintEngine {
        &self.constraints
    }

    /// Attach the Alias's current active HolderLinks.
    async fn enrich(&self, org: &OrganizationId, mut alias: Alias) -> Result<Alias, RegistryError> {
        alias.holder_links = self
            .holder_links
            .find_by_alias_id(org, alias.id, false)
            .await?;
        Ok(alias)
    }

    /// Validate list parameters before any store call.
    fn list_parameters(
        &self,
        metadata: &MetadataQuery,
        pagination: Option<Pagination>,
    ) -> Result<Pagination, RegistryError> {
        validate_metadata_query(metadata)?;
        self.config.pagination.resolve(pagination)
    }
}

fn mode(hard_delete: bool) -> &'static str {
    if hard_delete {
        "hard"
    } else {
        "soft"
    }
}
