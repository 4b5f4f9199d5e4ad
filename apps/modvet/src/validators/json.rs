//! Checkers shared by every JSON category: plain syntax and schema lint.

use crate::error::FatalError;
use crate::schema::{self, SchemaFetcher};
use crate::validator::{CheckError, Checker, Finding};
use serde_json::Value as Json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read and parse one target. Unreadable or malformed files are target
/// failures, never fatal.
pub fn read_json(target: &Path) -> Result<Json, CheckError> {
    let text = fs::read_to_string(target).map_err(|_| CheckError::Target("could not be read".into()))?;
    serde_json::from_str(&text).map_err(|e| CheckError::Target(e.to_string()))
}

/// Passes when the target parses as JSON. The parser message is the failure.
#[derive(Debug, Default)]
pub struct JsonSyntax;

impl Checker for JsonSyntax {
    type Session = ();

    fn begin(&self) -> Result<(), FatalError> {
        Ok(())
    }

    fn check(&self, _: &(), target: &Path) -> Result<Vec<Finding>, CheckError> {
        read_json(target)?;
        Ok(vec![Finding::ok()])
    }
}

/// Validates targets against a remote JSON schema.
///
/// The schema is fetched and compiled once per invocation in `begin`, so a
/// schema that cannot be obtained aborts the run before any target event is
/// recorded.
pub struct SchemaLint {
    fetcher: Arc<dyn SchemaFetcher>,
    schema_name: String,
    url: String,
    label: String,
}

impl SchemaLint {
    pub fn new(
        fetcher: Arc<dyn SchemaFetcher>,
        schema_name: impl Into<String>,
        url: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        SchemaLint {
            fetcher,
            schema_name: schema_name.into(),
            url: url.into(),
            label: label.into(),
        }
    }
}

impl Checker for SchemaLint {
    type Session = jsonschema::Validator;

    fn begin(&self) -> Result<jsonschema::Validator, FatalError> {
        schema::load_validator(self.fetcher.as_ref(), &self.schema_name, &self.url, &self.label)
    }

    fn check(&self, session: &jsonschema::Validator, target: &Path) -> Result<Vec<Finding>, CheckError> {
        let doc = read_json(target)?;
        let errors = schema::schema_errors(session, &doc);
        if errors.is_empty() {
            return Ok(vec![Finding::ok()]);
        }
        Ok(errors.into_iter().map(Finding::error).collect())
    }
}
