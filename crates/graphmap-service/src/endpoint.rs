//! Endpoint specs — the named entry points the request layer dispatches
//! to. Consumed fully parsed from the configuration loader; immutable
//! afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use graphmap_core::{GraphmapError, Result};

fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

/// One endpoint: a target class (generated queries) and/or an explicit
/// query template, plus default solution modifiers and declared output
/// formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub name: String,
    /// Root class (by JSON name) for generated queries and result trees.
    #[serde(default)]
    pub class: Option<String>,
    /// Explicit query template; recognized as a template iff it contains
    /// a `${name}` placeholder. Templates must bind the `?item` identity
    /// variable and keep rows for one entity contiguous.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

/// Immutable name → spec table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTable {
    endpoints: BTreeMap<String, EndpointSpec>,
}

impl EndpointTable {
    pub fn from_specs(specs: Vec<EndpointSpec>) -> Result<Self> {
        let mut endpoints = BTreeMap::new();
        for spec in specs {
            if spec.class.is_none() && spec.template.is_none() {
                return Err(GraphmapError::Configuration(format!(
                    "endpoint '{}' names neither a class nor a template",
                    spec.name
                )));
            }
            if endpoints.insert(spec.name.clone(), spec).is_some() {
                return Err(GraphmapError::Configuration(
                    "duplicate endpoint name".into(),
                ));
            }
        }
        Ok(EndpointTable { endpoints })
    }

    pub fn get(&self, name: &str) -> Result<&EndpointSpec> {
        self.endpoints
            .get(name)
            .ok_or_else(|| GraphmapError::BindingMismatch(format!("unknown endpoint '{}'", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.endpoints.values()
    }
}
