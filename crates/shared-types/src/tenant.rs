//! # Tenant Identifier
//!
//! Every registry collection is scoped to one organization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TenantError;

/// Organization (tenant) identifier.
///
/// Restricted to ASCII alphanumerics, `-` and `_` so it can be embedded in a
/// collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Result<Self, TenantError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TenantError::Empty);
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TenantError::InvalidCharacters(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection name for this tenant, e.g. `aliases_<org>`.
    ///
    /// Case is preserved: ids that differ only by case name different
    /// collections, just as they are different tenants.
    pub fn collection(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.0)
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrganizationId {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrganizationId> for String {
    fn from(value: OrganizationId) -> Self {
        value.0
    }
}
