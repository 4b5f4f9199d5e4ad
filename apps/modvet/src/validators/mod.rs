//! Concrete validators and the catalog the CLI selects from.
//!
//! Categories are [`ValidatorGroup`]s of ordered phases:
//! - `metadata`: `metadata-syntax`, `metadata-lint`
//! - `tasks`: `task-metadata-syntax`, `task-metadata-lint`
//! - `plans`: `plan-metadata-lint`
//!
//! Either a category or a single phase can be selected by name.

pub mod json;
pub mod metadata;
pub mod plans;
pub mod tasks;

use crate::error::FatalError;
use crate::schema::{SchemaFetcher, DEFAULT_PLAN_SCHEMA_URL, DEFAULT_TASK_SCHEMA_URL};
use crate::validator::Validator;
use std::sync::Arc;

/// Where the schema-backed validators get their schemas.
#[derive(Clone)]
pub struct SchemaSources {
    pub fetcher: Arc<dyn SchemaFetcher>,
    pub task_url: String,
    pub plan_url: String,
}

impl SchemaSources {
    pub fn new(fetcher: Arc<dyn SchemaFetcher>) -> Self {
        SchemaSources {
            fetcher,
            task_url: DEFAULT_TASK_SCHEMA_URL.to_string(),
            plan_url: DEFAULT_PLAN_SCHEMA_URL.to_string(),
        }
    }
}

/// Category name followed by its phases, in run order.
pub const CATALOG: &[(&str, &[&str])] = &[
    (metadata::GROUP, &[metadata::SYNTAX, metadata::LINT]),
    (tasks::GROUP, &[tasks::SYNTAX, tasks::LINT]),
    (plans::GROUP, &[plans::LINT]),
];

/// Every category, in run order.
pub fn registry(sources: &SchemaSources) -> Result<Vec<Box<dyn Validator>>, FatalError> {
    let mut out = Vec::new();
    for (group, _) in CATALOG {
        if let Some(v) = build(group, sources) {
            out.push(v?);
        }
    }
    Ok(out)
}

/// Validators for `names` (categories or phases), deduplicated and in the
/// order given. Unknown names are reported together.
pub fn select(names: &[String], sources: &SchemaSources) -> Result<Vec<Box<dyn Validator>>, FatalError> {
    if names.is_empty() {
        return registry(sources);
    }
    let mut seen: Vec<&str> = Vec::new();
    let mut out = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name.as_str());
        match build(name, sources) {
            Some(v) => out.push(v?),
            None => unknown.push(name.as_str()),
        }
    }
    if !unknown.is_empty() {
        return Err(FatalError::Config(format!(
            "Unknown validator(s): {}. Available: {}.",
            unknown.join(", "),
            known_names().join(", ")
        )));
    }
    Ok(out)
}

/// Every selectable name: each category followed by its phases.
pub fn known_names() -> Vec<&'static str> {
    CATALOG
        .iter()
        .flat_map(|(group, phases)| std::iter::once(*group).chain(phases.iter().copied()))
        .collect()
}

fn build(name: &str, sources: &SchemaSources) -> Option<Result<Box<dyn Validator>, FatalError>> {
    let fetcher = Arc::clone(&sources.fetcher);
    let built: Result<Box<dyn Validator>, FatalError> = match name {
        metadata::GROUP => Ok(Box::new(metadata::group())),
        metadata::SYNTAX => Ok(Box::new(metadata::syntax())),
        metadata::LINT => Ok(Box::new(metadata::lint())),
        tasks::GROUP => tasks::group(fetcher, &sources.task_url).map(boxed),
        tasks::SYNTAX => tasks::syntax().map(boxed),
        tasks::LINT => Ok(Box::new(tasks::lint(fetcher, &sources.task_url))),
        plans::GROUP => Ok(Box::new(plans::group(fetcher, &sources.plan_url))),
        plans::LINT => Ok(Box::new(plans::lint(fetcher, &sources.plan_url))),
        _ => return None,
    };
    Some(built)
}

fn boxed<V: Validator + 'static>(v: V) -> Box<dyn Validator> {
    Box::new(v)
}
