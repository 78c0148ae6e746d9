//! # Metadata
//!
//! Free-form key/value data attached to every registry entity.
//!
//! Metadata is never merged structurally: partial updates carry the keys to
//! set in a [`Metadata`] map and the keys to drop as explicit
//! `metadata.<key>` removal paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::MetadataError;

/// Maximum length of a metadata key.
pub const MAX_METADATA_KEY_LENGTH: usize = 100;

/// Maximum length of a metadata string value.
pub const MAX_METADATA_VALUE_LENGTH: usize = 2000;

/// Prefix of removal paths that address metadata keys.
pub const METADATA_PREFIX: &str = "metadata.";

/// A single metadata value.
///
/// Nested maps are accepted one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Nested(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// True for string, number and boolean values.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Nested(_))
    }

    fn validate(&self, key: &str, depth: usize) -> Result<(), MetadataError> {
        match self {
            Self::String(s) if s.chars().count() > MAX_METADATA_VALUE_LENGTH => {
                Err(MetadataError::ValueTooLong {
                    key: key.to_string(),
                    max: MAX_METADATA_VALUE_LENGTH,
                })
            }
            Self::Nested(_) if depth > 0 => Err(MetadataError::NestingTooDeep {
                key: key.to_string(),
            }),
            Self::Nested(children) => {
                for (child_key, child) in children {
                    validate_key(child_key)?;
                    child.validate(child_key, depth + 1)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<MetadataValue> for serde_json::Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(b) => serde_json::Value::Bool(b),
            MetadataValue::Int(i) => serde_json::Value::from(i),
            MetadataValue::Float(f) => serde_json::Value::from(f),
            MetadataValue::String(s) => serde_json::Value::String(s),
            MetadataValue::Nested(children) => serde_json::Value::Object(
                children
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn validate_key(key: &str) -> Result<(), MetadataError> {
    if key.is_empty() {
        return Err(MetadataError::EmptyKey);
    }
    if key.chars().count() > MAX_METADATA_KEY_LENGTH {
        return Err(MetadataError::KeyTooLong {
            key: key.chars().take(16).collect(),
            max: MAX_METADATA_KEY_LENGTH,
        });
    }
    // Keys are addressed as `metadata.<key>` paths in stores and filters.
    if key.contains('.') || key.starts_with('$') {
        return Err(MetadataError::ReservedCharacter {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Metadata attached to an entity.
///
/// Absent metadata is always represented as an empty map, never as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    /// Create an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    /// Overlay `other` on top of this map (keys in `other` win).
    pub fn merge(&mut self, other: &Metadata) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Validate keys, value lengths and nesting depth.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for (key, value) in &self.0 {
            validate_key(key)?;
            value.validate(key, 0)?;
        }
        Ok(())
    }

    /// Extract the metadata key from a `metadata.<key>` removal path.
    pub fn removal_key(path: &str) -> Result<&str, MetadataError> {
        match path.strip_prefix(METADATA_PREFIX) {
            Some(key) if !key.is_empty() => {
                validate_key(key)?;
                Ok(key)
            }
            _ => Err(MetadataError::InvalidRemovalPath {
                path: path.to_string(),
            }),
        }
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, MetadataValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Equality filters on metadata sub-keys for list operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataQuery(BTreeMap<String, MetadataValue>);

impl MetadataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style filter on `metadata.<key> == value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    /// Reject empty or oversized keys and non-scalar or oversized values.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for (key, value) in &self.0 {
            validate_key(key)?;
            if !value.is_scalar() {
                return Err(MetadataError::NonScalarQueryValue { key: key.clone() });
            }
            value.validate(key, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_default_is_empty() {
        let metadata = Metadata::default();
        assert!(metadata.is_empty());
        assert_eq!(serde_json::to_string(&metadata).unwrap(), "{}");
    }

    #[test]
    fn test_metadata_serde_untagged() {
        let json = r#"{"active":true,"count":3,"ratio":0.5,"name":"x","nested":{"a":"b"}}"#;
        let metadata: Metadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.get("active"), Some(&MetadataValue::Bool(true)));
        assert_eq!(metadata.get("count"), Some(&MetadataValue::Int(3)));
        assert_eq!(metadata.get("ratio"), Some(&MetadataValue::Float(0.5)));
        assert_eq!(metadata.get("name"), Some(&MetadataValue::from("x")));
        assert!(matches!(metadata.get("nested"), Some(MetadataValue::Nested(_))));
    }

    #[test]
    fn test_metadata_validate_rejects_long_key() {
        let metadata = Metadata::new().with("k".repeat(101), "v");
        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::KeyTooLong { .. })
        ));
    }

    #[test]
    fn test_metadata_validate_rejects_long_value() {
        let metadata = Metadata::new().with("k", "v".repeat(2001));
        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::ValueTooLong { .. })
        ));
    }

    #[test]
    fn test_metadata_validate_rejects_deep_nesting() {
        let inner: BTreeMap<String, MetadataValue> =
            [("c".to_string(), MetadataValue::from("d"))].into();
        let outer: BTreeMap<String, MetadataValue> =
            [("b".to_string(), MetadataValue::Nested(inner))].into();
        let metadata = Metadata::new().with("a", MetadataValue::Nested(outer));

        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_metadata_merge_overrides() {
        let mut base = Metadata::new().with("a", "1").with("b", "2");
        base.merge(&Metadata::new().with("b", "3"));

        assert_eq!(base.get("a"), Some(&MetadataValue::from("1")));
        assert_eq!(base.get("b"), Some(&MetadataValue::from("3")));
    }

    #[test]
    fn test_metadata_validate_rejects_path_characters() {
        for key in ["a.b", "$set", "tier."] {
            let metadata = Metadata::new().with(key, "x");
            assert!(
                matches!(metadata.validate(), Err(MetadataError::ReservedCharacter { .. })),
                "{key} accepted"
            );
        }

        let nested: BTreeMap<String, MetadataValue> =
            [("c.d".to_string(), MetadataValue::from("x"))].into();
        let metadata = Metadata::new().with("a", MetadataValue::Nested(nested));
        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::ReservedCharacter { .. })
        ));

        assert!(MetadataQuery::new().with("a.b", "x").validate().is_err());
        assert!(Metadata::removal_key("metadata.a.b").is_err());
        assert!(Metadata::new().with("tier_1-$", "x").validate().is_ok());
    }

    #[test]
    fn test_removal_key() {
        assert_eq!(Metadata::removal_key("metadata.segment").unwrap(), "segment");
        assert!(Metadata::removal_key("metadata.").is_err());
        assert!(Metadata::removal_key("document").is_err());
    }

    #[test]
    fn test_query_rejects_nested_value() {
        let query = MetadataQuery::new().with("a", MetadataValue::Nested(BTreeMap::new()));
        assert!(matches!(
            query.validate(),
            Err(MetadataError::NonScalarQueryValue { .. })
        ));
    }
}
