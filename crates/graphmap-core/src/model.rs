//! Mapping model — the static class/property-to-JSON schema.
//!
//! ClassSpecs live in an arena indexed by `ClassId`, so a property whose
//! nested class equals an ancestor class (self-referential mappings) is
//! representable without recursive ownership. The model is immutable after
//! load and shared read-only across concurrent request processing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{GraphmapError, Result};

/// Arena index of a ClassSpec inside its ModelSpec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub usize);

/// What happens when a non-multivalued property receives more than one
/// distinct bound value for one entity. An explicit load-time choice, not
/// an inferred default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtraValuePolicy {
    /// Keep the first distinct value, warn about the rest.
    #[default]
    FirstWins,
    /// Keep the last distinct value.
    LastWins,
    /// Surface a Configuration error — the mapping is mis-declared.
    Error,
}

/// One predicate mapping: identifier, JSON field name, flags, and an
/// optional nested class for object-valued properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// CURIE (`rt:severity`) or absolute URI.
    pub uri: String,
    pub json_name: String,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub multivalued: bool,
    /// Deduplicate accumulated values (first occurrence kept).
    #[serde(default)]
    pub set_like: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub nested: Option<ClassId>,
}

/// A (possibly anonymous) entity type with an ordered property list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    /// CURIE or absolute URI; empty for anonymous classes (no type triple).
    #[serde(default)]
    pub type_uri: String,
    pub json_name: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

impl ClassSpec {
    pub fn property(&self, json_name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.json_name == json_name)
    }
}

/// Root container: prefix table plus the class arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Namespace prefix → namespace URI.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub extra_values: ExtraValuePolicy,
}

impl ModelSpec {
    pub fn class(&self, id: ClassId) -> Result<&ClassSpec> {
        self.classes.get(id.0).ok_or_else(|| {
            GraphmapError::Configuration(format!("class id {} out of range", id.0))
        })
    }

    pub fn find_class(&self, json_name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.json_name == json_name)
            .map(ClassId)
    }

    /// Load-time validation. Checks sibling field-name uniqueness, prefix
    /// resolution of every CURIE actually used, arena index bounds, and
    /// JSON-name shape (names double as query variable fragments).
    pub fn validate(&self) -> Result<()> {
        let mut class_names = BTreeSet::new();
        for class in &self.classes {
            if !class.type_uri.is_empty() {
                self.check_uri(&class.type_uri)?;
            }
            if !class_names.insert(class.json_name.as_str()) {
                return Err(GraphmapError::Configuration(format!(
                    "duplicate class name '{}'",
                    class.json_name
                )));
            }
            let mut sibling_names = BTreeSet::new();
            for prop in &class.properties {
                if !sibling_names.insert(prop.json_name.as_str()) {
                    return Err(GraphmapError::Configuration(format!(
                        "duplicate field name '{}' in class '{}'",
                        prop.json_name, class.json_name
                    )));
                }
                if !is_valid_json_name(&prop.json_name) {
                    return Err(GraphmapError::Configuration(format!(
                        "invalid field name '{}' in class '{}'",
                        prop.json_name, class.json_name
                    )));
                }
                self.check_uri(&prop.uri)?;
                if let Some(nested) = prop.nested {
                    if nested.0 >= self.classes.len() {
                        return Err(GraphmapError::Configuration(format!(
                            "field '{}' in class '{}' references class id {} out of range",
                            prop.json_name, class.json_name, nested.0
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_uri(&self, uri: &str) -> Result<()> {
        if is_absolute_uri(uri) {
            return Ok(());
        }
        match curie_prefix(uri) {
            Some(prefix) if self.prefixes.contains_key(prefix) => Ok(()),
            Some(prefix) => Err(GraphmapError::Configuration(format!(
                "unresolved prefix '{}' in '{}'",
                prefix, uri
            ))),
            None => Err(GraphmapError::Configuration(format!(
                "'{}' is neither an absolute URI nor a prefixed name",
                uri
            ))),
        }
    }
}

pub fn is_absolute_uri(uri: &str) -> bool {
    uri.contains("://") || uri.starts_with("urn:")
}

/// Prefix part of a CURIE, or None for absolute/bare names.
pub fn curie_prefix(uri: &str) -> Option<&str> {
    if is_absolute_uri(uri) {
        return None;
    }
    uri.split_once(':').map(|(prefix, _)| prefix)
}

// Field names double as query variable fragments and as request parameter
// names, so they must start with a letter (the `_` prefix is reserved).
fn is_valid_json_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
