//! `tasks/*.json` checks.

use super::json::{JsonSyntax, SchemaLint};
use crate::error::FatalError;
use crate::schema::SchemaFetcher;
use crate::targets::NamingRule;
use crate::validator::{FileValidator, ValidatorGroup};
use regex::Regex;
use std::sync::Arc;

pub const SYNTAX: &str = "task-metadata-syntax";
pub const LINT: &str = "task-metadata-lint";
pub const GROUP: &str = "tasks";

const PATTERN: &str = "tasks/*.json";

pub const INVALID_NAME: &str = "Invalid task name. Task names must start with a lowercase letter and can only contain lowercase letters, numbers, and underscores.";

pub fn naming_rule() -> Result<NamingRule, FatalError> {
    let regex = Regex::new(r"^[a-z][a-z0-9_]*$").map_err(|e| FatalError::Config(e.to_string()))?;
    Ok(NamingRule {
        regex,
        message: INVALID_NAME.to_string(),
    })
}

pub fn syntax() -> Result<FileValidator<JsonSyntax>, FatalError> {
    Ok(
        FileValidator::new(SYNTAX, &[PATTERN], "Checking task metadata syntax", "Task syntax", JsonSyntax)
            .with_naming(naming_rule()?),
    )
}

pub fn lint(fetcher: Arc<dyn SchemaFetcher>, url: &str) -> FileValidator<SchemaLint> {
    FileValidator::new(
        LINT,
        &[PATTERN],
        "Checking task metadata style",
        "Task style",
        SchemaLint::new(fetcher, "task.json", url, "Task Metadata"),
    )
}

pub fn group(fetcher: Arc<dyn SchemaFetcher>, url: &str) -> Result<ValidatorGroup, FatalError> {
    Ok(ValidatorGroup::new(
        GROUP,
        "Tasks",
        vec![Box::new(syntax()?), Box::new(lint(fetcher, url))],
    ))
}
