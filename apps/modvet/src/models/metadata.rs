//! Module manifest (`metadata.json`) schema used by the metadata lint.
//!
//! Every field is optional at the serde level so that the lint can report
//! each missing field on its own instead of failing on the first one.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
/// Root of `metadata.json`.
pub struct Metadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<Dependency>>,
}

#[derive(Debug, Default, Deserialize)]
/// A dependency entry; `version_requirement` is optional.
pub struct Dependency {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version_requirement: Option<String>,
}
