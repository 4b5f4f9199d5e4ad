//! `metadata.json` checks.

use super::json::{read_json, JsonSyntax};
use crate::error::FatalError;
use crate::models::metadata::Metadata;
use crate::validator::{CheckError, Checker, FileValidator, Finding, ValidatorGroup};
use regex::Regex;
use std::path::Path;

pub const SYNTAX: &str = "metadata-syntax";
pub const LINT: &str = "metadata-lint";
pub const GROUP: &str = "metadata";

const PATTERN: &str = "metadata.json";

pub fn syntax() -> FileValidator<JsonSyntax> {
    FileValidator::new(SYNTAX, &[PATTERN], "Checking metadata syntax", "Metadata syntax", JsonSyntax)
}

pub fn lint() -> FileValidator<MetadataLint> {
    FileValidator::new(LINT, &[PATTERN], "Checking metadata style", "Metadata style", MetadataLint)
}

/// Syntax first; style is only checked once the manifest parses.
pub fn group() -> ValidatorGroup {
    ValidatorGroup::new(GROUP, "Metadata", vec![Box::new(syntax()), Box::new(lint())])
}

pub struct MetadataRules {
    name: Regex,
    version: Regex,
}

impl MetadataRules {
    fn new() -> Result<Self, FatalError> {
        let compile = |re: &str| Regex::new(re).map_err(|e| FatalError::Config(e.to_string()));
        Ok(MetadataRules {
            name: compile(r"^[A-Za-z0-9]+[-/][a-z][a-z0-9_]*$")?,
            version: compile(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")?,
        })
    }
}

/// Field-level rules for the module manifest.
#[derive(Debug, Default)]
pub struct MetadataLint;

impl Checker for MetadataLint {
    type Session = MetadataRules;

    fn begin(&self) -> Result<MetadataRules, FatalError> {
        MetadataRules::new()
    }

    fn check(&self, rules: &MetadataRules, target: &Path) -> Result<Vec<Finding>, CheckError> {
        let doc = read_json(target)?;
        let meta: Metadata = serde_json::from_value(doc)
            .map_err(|e| CheckError::Target(format!("not a valid module manifest: {}", e)))?;
        let mut findings = Vec::new();

        match meta.name.as_deref() {
            None => findings.push(missing("name")),
            Some(n) if !rules.name.is_match(n) => findings.push(Finding::error(format!(
                "Field 'name' must be of the form 'owner-module', got '{}'",
                n
            ))),
            Some(_) => {}
        }
        match meta.version.as_deref() {
            None => findings.push(missing("version")),
            Some(v) if !rules.version.is_match(v) => findings.push(Finding::error(format!(
                "Field 'version' is not a semantic version: '{}'",
                v
            ))),
            Some(_) => {}
        }
        for (field, value) in [
            ("author", &meta.author),
            ("summary", &meta.summary),
            ("source", &meta.source),
        ] {
            if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                findings.push(missing(field));
            }
        }
        match meta.dependencies.as_deref() {
            None => findings.push(missing("dependencies")),
            Some(deps) => {
                for (i, dep) in deps.iter().enumerate() {
                    if dep.name.is_none() {
                        findings.push(Finding::error(format!("Dependency #{} has no 'name'", i + 1)));
                    }
                }
            }
        }
        if meta.license.is_none() {
            findings.push(Finding::warning("Field 'license' is missing"));
        }

        if findings.iter().all(|f| f.passed) {
            findings.insert(0, Finding::ok());
        }
        Ok(findings)
    }
}

fn missing(field: &str) -> Finding {
    Finding::error(format!("Required field '{}' is missing", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::test_support::memory_sink;
    use crate::progress::ProgressHub;
    use crate::report::Report;
    use crate::validator::{InvokeOptions, Validator};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    const GOOD: &str = r#"{
        "name": "acme-ntp",
        "version": "1.2.0",
        "author": "acme",
        "summary": "Manages ntp",
        "license": "Apache-2.0",
        "source": "https://example.com/acme/ntp",
        "dependencies": [{"name": "puppetlabs/stdlib", "version_requirement": ">= 4.0.0"}]
    }"#;

    fn run(body: &str) -> (i32, Report) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("metadata.json"), body).unwrap();
        let (sink, _out) = memory_sink();
        let hub = Arc::new(ProgressHub::with_sink(false, sink));
        let report = Report::new();
        let code = group()
            .invoke(&report, &InvokeOptions::new(dir.path(), hub))
            .unwrap();
        (code, report)
    }

    #[test]
    fn test_complete_manifest_passes_both_phases() {
        let (code, report) = run(GOOD);
        assert_eq!(code, 0);
        assert_eq!(report.len(), 2);
        assert!(report.events().iter().all(|e| !e.is_failure()));
        assert_eq!(report.events_from(LINT)[0].severity(), "ok");
    }

    #[test]
    fn test_syntax_error_stops_before_lint() {
        let (code, report) = run("{ \"name\": ");
        assert_eq!(code, 1);
        assert_eq!(report.events_from(SYNTAX).len(), 1);
        assert!(report.events_from(LINT).is_empty());
    }

    #[test]
    fn test_missing_license_is_a_passing_warning() {
        let body = GOOD.replace("\"license\": \"Apache-2.0\",", "");
        let (code, report) = run(&body);
        assert_eq!(code, 0);
        let lint = report.events_from(LINT);
        assert_eq!(lint[0].severity(), "warning");
        assert!(!lint[0].is_failure());
    }

    #[test]
    fn test_field_violations_fold_into_one_failure() {
        let body = GOOD
            .replace("acme-ntp", "ntp")
            .replace("1.2.0", "one")
            .replace("\"name\": \"puppetlabs/stdlib\", ", "");
        let (code, report) = run(&body);
        assert_eq!(code, 1);
        let lint = report.events_from(LINT);
        assert_eq!(lint.len(), 1);
        let msg = lint[0].message().unwrap();
        assert!(msg.contains("owner-module"));
        assert!(msg.contains("semantic version"));
        assert!(msg.contains("Dependency #1"));
    }
}
