//! Schema mapping model, validation, and JSON persistence.
//!
//! A [`SchemaMapping`] is the declarative contract driving a harmonization
//! run: an ordered mapping from source column name to a [`ColumnSpec`] naming
//! the target column, its semantic type, and its constraints. The on-disk
//! artifact is a JSON object in exactly that shape; document order is
//! preserved because mapping order decides both output column order and the
//! tie-break when two sources rename to the same target.
//!
//! The engine never mutates or persists a mapping. It is an immutable input
//! per invocation, whether it came from the suggestion oracle or from a hand
//! edit.

use std::{fmt, fs::File, path::Path};

use anyhow::{Context, Result};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;

/// Failure modes of the mapping contract itself.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("schema mapping document is malformed: {0}")]
    Malformed(String),
    #[error("source column '{0}' maps to an empty target name")]
    EmptyTargetName(String),
}

/// Target semantic type of a mapped column.
///
/// Tokens outside the recognized set are preserved verbatim and coerce as the
/// identity transform rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    String,
    Integer,
    Float,
    Date,
    Identity(String),
}

impl TargetType {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "string" => TargetType::String,
            "integer" => TargetType::Integer,
            "float" => TargetType::Float,
            "date" => TargetType::Date,
            _ => TargetType::Identity(token.to_string()),
        }
    }

    pub fn as_token(&self) -> &str {
        match self {
            TargetType::String => "string",
            TargetType::Integer => "integer",
            TargetType::Float => "float",
            TargetType::Date => "date",
            TargetType::Identity(raw) => raw,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

impl Serialize for TargetType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_token())
    }
}

impl<'de> Deserialize<'de> for TargetType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(TargetType::from_token(&token))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub required: bool,
    pub unique: bool,
}

/// Per-column contract: target name, target type, and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(rename = "name")]
    pub target_name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnSpec {
    pub fn new(target_name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            target_name: target_name.into(),
            target_type,
            constraints: Constraints::default(),
            primary_key: false,
        }
    }
}

/// Ordered mapping from source column name to [`ColumnSpec`].
///
/// Source names are unique within a mapping; a JSON document repeating a
/// source key is rejected at load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMapping {
    entries: Vec<(String, ColumnSpec)>,
}

impl SchemaMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping entry, replacing any existing spec for the same source.
    pub fn insert(&mut self, source: impl Into<String>, spec: ColumnSpec) {
        let source = source.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == source)
        {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((source, spec)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ColumnSpec)> {
        self.entries
            .iter()
            .map(|(source, spec)| (source.as_str(), spec))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(source, _)| source.as_str())
    }

    pub fn get(&self, source: &str) -> Option<&ColumnSpec> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == source)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the mapping invariants without touching any data.
    pub fn validate(&self) -> Result<(), MappingError> {
        for (source, spec) in self.entries() {
            if spec.target_name.trim().is_empty() {
                return Err(MappingError::EmptyTargetName(source.to_string()));
            }
        }
        Ok(())
    }

    pub fn from_json_str(document: &str) -> Result<Self, MappingError> {
        serde_json::from_str(document).map_err(|err| MappingError::Malformed(err.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing schema mapping to JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path)
            .with_context(|| format!("Opening mapping file {path:?}"))?;
        let mapping = Self::from_json_str(&document)
            .with_context(|| format!("Parsing mapping JSON from {path:?}"))?;
        Ok(mapping)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating mapping file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing mapping JSON")
    }
}

impl Serialize for SchemaMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, spec) in &self.entries {
            map.serialize_entry(source, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = SchemaMapping;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object of source columns to column specs")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, ColumnSpec)> = Vec::new();
                while let Some((source, spec)) = access.next_entry::<String, ColumnSpec>()? {
                    if entries.iter().any(|(existing, _)| *existing == source) {
                        return Err(de::Error::custom(format!(
                            "duplicate source column '{source}'"
                        )));
                    }
                    entries.push((source, spec));
                }
                Ok(SchemaMapping { entries })
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Order ID": {
            "name": "order_id",
            "type": "integer",
            "constraints": {"required": true, "unique": true},
            "primary_key": true
        },
        "Customer": {"name": "customer", "type": "string"},
        "Total": {"name": "total", "type": "float"}
    }"#;

    #[test]
    fn from_json_str_preserves_document_order() {
        let mapping = SchemaMapping::from_json_str(SAMPLE).unwrap();
        let sources: Vec<&str> = mapping.sources().collect();
        assert_eq!(sources, vec!["Order ID", "Customer", "Total"]);
    }

    #[test]
    fn constraints_and_primary_key_default_to_false() {
        let mapping = SchemaMapping::from_json_str(SAMPLE).unwrap();
        let spec = mapping.get("Customer").unwrap();
        assert!(!spec.constraints.required);
        assert!(!spec.constraints.unique);
        assert!(!spec.primary_key);
    }

    #[test]
    fn spec_without_type_is_rejected() {
        let document = r#"{"A": {"name": "id"}}"#;
        let err = SchemaMapping::from_json_str(document).unwrap_err();
        assert!(matches!(err, MappingError::Malformed(_)));
    }

    #[test]
    fn spec_without_name_is_rejected() {
        let document = r#"{"A": {"type": "integer"}}"#;
        assert!(SchemaMapping::from_json_str(document).is_err());
    }

    #[test]
    fn unrecognized_type_token_is_preserved_as_identity() {
        let document = r#"{"A": {"name": "blob", "type": "geometry"}}"#;
        let mapping = SchemaMapping::from_json_str(document).unwrap();
        let spec = mapping.get("A").unwrap();
        assert_eq!(
            spec.target_type,
            TargetType::Identity("geometry".to_string())
        );
        assert_eq!(spec.target_type.as_token(), "geometry");
    }

    #[test]
    fn duplicate_source_column_is_rejected() {
        let document = r#"{
            "A": {"name": "id", "type": "integer"},
            "A": {"name": "id2", "type": "string"}
        }"#;
        let err = SchemaMapping::from_json_str(document).unwrap_err();
        assert!(err.to_string().contains("duplicate source column"));
    }

    #[test]
    fn validate_rejects_empty_target_name() {
        let mut mapping = SchemaMapping::new();
        mapping.insert("A", ColumnSpec::new("  ", TargetType::String));
        let err = mapping.validate().unwrap_err();
        assert!(matches!(err, MappingError::EmptyTargetName(_)));
    }

    #[test]
    fn json_round_trip_keeps_entries_and_order() {
        let mapping = SchemaMapping::from_json_str(SAMPLE).unwrap();
        let rendered = mapping.to_json_string().unwrap();
        let reloaded = SchemaMapping::from_json_str(&rendered).unwrap();
        assert_eq!(mapping, reloaded);
    }

    #[test]
    fn insert_replaces_existing_source_entry() {
        let mut mapping = SchemaMapping::new();
        mapping.insert("A", ColumnSpec::new("first", TargetType::String));
        mapping.insert("A", ColumnSpec::new("second", TargetType::Integer));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("A").unwrap().target_name, "second");
    }
}
