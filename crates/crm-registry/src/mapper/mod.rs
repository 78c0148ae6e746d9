//! # Entity-Document Mapper
//!
//! Two-way conversion between plaintext entities and their persisted
//! documents.
//!
//! - Sensitive fields with a non-empty value are encrypted; empty values are
//!   stored as null.
//! - Searchable values also get a token under `search.<field>`.
//! - A null ciphertext reads back as an absent value.
//! - Search tokens are never read back.
//! - Absent metadata is stored as an empty map.
//!
//! Any codec failure aborts the whole conversion.

pub mod alias;
pub mod holder;
pub mod holder_link;
pub mod update;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{CodecError, EntityKind, RegistryError};
use crate::ports::{Document, FieldCodec};

pub use alias::{AliasDocument, AliasSearch};
pub use holder::{HolderDocument, HolderSearch};
pub use holder_link::HolderLinkDocument;
pub use update::{alias_update, holder_link_update, holder_update, soft_delete};

/// Mapping failure.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Codec refused a value.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Document shape does not match.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl MapperError {
    /// Attach entity and operation context.
    pub fn into_registry_error(self, entity: EntityKind, operation: &'static str) -> RegistryError {
        match self {
            Self::Codec(source) => RegistryError::Codec {
                entity,
                operation,
                source,
            },
            Self::Serialization(e) => RegistryError::Serialization {
                entity,
                reason: e.to_string(),
            },
        }
    }
}

/// Persisted form of an entity.
pub trait EntityDocument: Sized + Serialize + DeserializeOwned {
    /// Plaintext entity.
    type Entity;

    /// Encrypt and tokenize.
    fn from_entity(entity: &Self::Entity, codec: &dyn FieldCodec) -> Result<Self, MapperError>;

    /// Decrypt.
    fn into_entity(self, codec: &dyn FieldCodec) -> Result<Self::Entity, MapperError>;

    /// Serialize to a store document.
    fn to_document(&self) -> Result<Document, MapperError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(MapperError::Serialization(<serde_json::Error as serde::ser::Error>::custom(
                format!("expected an object, got {}", json_kind(&other)),
            ))),
        }
    }

    /// Deserialize from a store document.
    fn from_document(document: Document) -> Result<Self, MapperError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// Entity to store document.
pub fn encode<D: EntityDocument>(
    entity: &D::Entity,
    codec: &dyn FieldCodec,
) -> Result<Document, MapperError> {
    D::from_entity(entity, codec)?.to_document()
}

/// Store document to entity.
pub fn decode<D: EntityDocument>(
    document: Document,
    codec: &dyn FieldCodec,
) -> Result<D::Entity, MapperError> {
    D::from_document(document)?.into_entity(codec)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Field helpers
// =============================================================================

pub(crate) fn encrypt_opt(
    codec: &dyn FieldCodec,
    value: Option<&str>,
) -> Result<Option<String>, CodecError> {
    match value {
        Some(v) if !v.is_empty() => codec.encrypt(v).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn decrypt_opt(
    codec: &dyn FieldCodec,
    value: Option<&str>,
) -> Result<Option<String>, CodecError> {
    value.map(|c| codec.decrypt(c)).transpose()
}

pub(crate) fn hash_opt(codec: &dyn FieldCodec, value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| codec.hash(v))
}

/// Required string: empty stays empty.
pub(crate) fn encrypt_str(codec: &dyn FieldCodec, value: &str) -> Result<String, CodecError> {
    Ok(encrypt_opt(codec, Some(value))?.unwrap_or_default())
}

pub(crate) fn decrypt_str(codec: &dyn FieldCodec, value: &str) -> Result<String, CodecError> {
    if value.is_empty() {
        Ok(String::new())
    } else {
        codec.decrypt(value)
    }
}
