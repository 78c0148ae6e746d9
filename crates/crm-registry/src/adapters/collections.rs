//! Per-tenant collection resolution shared by the document repositories.

use std::collections::HashSet;

use crm_telemetry::{metric_inc, time_histogram, STORE_OPERATIONS, STORE_OPERATION_DURATION};
use crm_telemetry::metrics::HistogramTimer;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{MetadataQuery, OrganizationId};
use tracing::debug;

use crate::domain::{EntityKind, RegistryError, StoreError};
use crate::mapper::MapperError;
use crate::ports::{DocumentStore, Filter, IndexSpec};

/// Collection set of one entity kind, one collection per organization.
///
/// Indexes are declared on first use of each collection.
pub(crate) struct TenantCollections {
    entity: EntityKind,
    prefix: &'static str,
    indexes: fn() -> Vec<IndexSpec>,
    ensured: RwLock<HashSet<String>>,
}

impl TenantCollections {
    pub(crate) fn new(entity: EntityKind, prefix: &'static str, indexes: fn() -> Vec<IndexSpec>) -> Self {
        Self {
            entity,
            prefix,
            indexes,
            ensured: RwLock::new(HashSet::new()),
        }
    }

    /// Collection name for `org`, with its indexes in place.
    pub(crate) async fn resolve(
        &self,
        store: &dyn DocumentStore,
        org: &OrganizationId,
    ) -> Result<String, RegistryError> {
        let name = org.collection(self.prefix);
        let known = self.ensured.read().contains(&name);
        if known {
            return Ok(name);
        }

        debug!("[crm-registry] Ensuring indexes on {}", name);
        let result = store.ensure_indexes(&name, &(self.indexes)()).await;
        self.record("ensure_indexes", result)?;
        self.ensured.write().insert(name.clone());
        Ok(name)
    }

    /// Start timing one store call.
    pub(crate) fn timer(&self, operation: &'static str) -> HistogramTimer {
        time_histogram!(STORE_OPERATION_DURATION, &[self.entity.as_str(), operation])
    }

    /// Count the outcome of a store call and attach context to failures.
    pub(crate) fn record<T>(
        &self,
        operation: &'static str,
        result: Result<T, StoreError>,
    ) -> Result<T, RegistryError> {
        let outcome = match &result {
            Ok(_) => "ok",
            Err(StoreError::DuplicateKey(_)) => "conflict",
            Err(_) => "error",
        };
        metric_inc!(STORE_OPERATIONS, &[self.entity.as_str(), operation, outcome]);

        result.map_err(|err| match err {
            StoreError::DuplicateKey(conflict) => RegistryError::UniqueViolation {
                entity: self.entity,
                conflict,
            },
            source => RegistryError::Store {
                entity: self.entity,
                operation,
                source,
            },
        })
    }

    /// Attach context to a mapping failure.
    pub(crate) fn mapping(&self, operation: &'static str) -> impl Fn(MapperError) -> RegistryError {
        let entity = self.entity;
        move |err| err.into_registry_error(entity, operation)
    }

    /// Not-found error for `id`.
    pub(crate) fn not_found(&self, id: impl ToString) -> RegistryError {
        RegistryError::not_found(self.entity, id.to_string())
    }
}

/// Add `metadata.<key> = value` conditions.
pub(crate) fn metadata_filter(mut filter: Filter, query: &MetadataQuery) -> Filter {
    for (key, value) in query.iter() {
        filter = filter.eq(format!("metadata.{}", key), Value::from(value.clone()));
    }
    filter
}
