//! `plans/*.json` checks.

use super::json::SchemaLint;
use crate::schema::SchemaFetcher;
use crate::validator::{FileValidator, TargetLabel, ValidatorGroup};
use std::sync::Arc;

pub const LINT: &str = "plan-metadata-lint";
pub const GROUP: &str = "plans";

const PATTERN: &str = "plans/*.json";

/// Plan metadata against the plan schema. Progress names the pattern rather
/// than every plan file.
pub fn lint(fetcher: Arc<dyn SchemaFetcher>, url: &str) -> FileValidator<SchemaLint> {
    FileValidator::new(
        LINT,
        &[PATTERN],
        "Checking plan metadata style",
        "Plan style",
        SchemaLint::new(fetcher, "plan.json", url, "Plan Metadata"),
    )
    .labelled_by(TargetLabel::Pattern)
}

pub fn group(fetcher: Arc<dyn SchemaFetcher>, url: &str) -> ValidatorGroup {
    ValidatorGroup::new(GROUP, "Plans", vec![Box::new(lint(fetcher, url))])
}
