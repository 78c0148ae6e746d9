//! HolderLink document. Nothing in a link is sensitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Metadata;
use uuid::Uuid;

use super::{EntityDocument, MapperError};
use crate::domain::{HolderLink, LinkType};
use crate::ports::FieldCodec;

/// Persisted HolderLink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderLinkDocument {
    /// Primary key.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Linked Holder.
    pub holder_id: Uuid,
    /// Linked Alias.
    pub alias_id: Uuid,
    /// Relationship type.
    pub link_type: LinkType,
    /// Metadata, never null.
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityDocument for HolderLinkDocument {
    type Entity = HolderLink;

    fn from_entity(link: &HolderLink, _codec: &dyn FieldCodec) -> Result<Self, MapperError> {
        Ok(Self {
            id: link.id,
            holder_id: link.holder_id,
            alias_id: link.alias_id,
            link_type: link.link_type,
            metadata: link.metadata.clone(),
            created_at: link.created_at,
            updated_at: link.updated_at,
            deleted_at: link.deleted_at,
        })
    }

    fn into_entity(self, _codec: &dyn FieldCodec) -> Result<HolderLink, MapperError> {
        Ok(HolderLink {
            id: self.id,
            holder_id: self.holder_id,
            alias_id: self.alias_id,
            link_type: self.link_type,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}
