//! Remote JSON schemas used by the task and plan lints.
//!
//! Schemas are looked up in a local cache first and downloaded on a miss.
//! A schema that cannot be obtained at all aborts the run; there is no
//! retry here.

use crate::error::FatalError;
use serde_json::Value as Json;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_TASK_SCHEMA_URL: &str = "https://forgeapi.puppet.com/schemas/task.json";
pub const DEFAULT_PLAN_SCHEMA_URL: &str = "https://forgeapi.puppet.com/schemas/task.json";
pub const DEFAULT_CACHE_DIR: &str = ".modvet/schemas";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
#[error("Unable to download {url} for {name}. {reason}")]
pub struct DownloadError {
    pub name: String,
    pub url: String,
    pub reason: String,
}

/// Fetches a named schema document.
pub trait SchemaFetcher: Send + Sync {
    fn fetch(&self, name: &str, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Cache-first fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct VendoredSchemas {
    cache_dir: PathBuf,
}

impl VendoredSchemas {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        VendoredSchemas {
            cache_dir: cache_dir.into(),
        }
    }
}

impl SchemaFetcher for VendoredSchemas {
    fn fetch(&self, name: &str, url: &str) -> Result<Vec<u8>, DownloadError> {
        let cached = self.cache_dir.join(name);
        if let Ok(bytes) = fs::read(&cached) {
            debug!("schema {} served from {}", name, cached.display());
            return Ok(bytes);
        }
        info!("downloading schema {} from {}", name, url);
        let body = download(url).map_err(|reason| DownloadError {
            name: name.to_string(),
            url: url.to_string(),
            reason,
        })?;
        if let Err(e) = fs::create_dir_all(&self.cache_dir).and_then(|_| fs::write(&cached, &body)) {
            warn!("could not cache schema {}: {}", name, e);
        }
        Ok(body)
    }
}

fn download(url: &str) -> Result<Vec<u8>, String> {
    if let Some(path) = url.strip_prefix("file://") {
        return fs::read(path).map_err(|e| e.to_string());
    }
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;
    let resp = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;
    let bytes = resp.bytes().map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

/// Fetch, parse and compile a schema. `label` names it in error messages.
pub fn load_validator(
    fetcher: &dyn SchemaFetcher,
    name: &str,
    url: &str,
    label: &str,
) -> Result<jsonschema::Validator, FatalError> {
    let bytes = fetcher.fetch(name, url)?;
    let schema: Json = serde_json::from_slice(&bytes)
        .map_err(|_| FatalError::schema(format!("Failed to parse {} schema file.", label)))?;
    jsonschema::validator_for(&schema)
        .map_err(|e| FatalError::schema(format!("Unable to validate {}. {}.", label, e)))
}

/// Human-readable schema violations for `instance`, empty when valid.
pub fn schema_errors(validator: &jsonschema::Validator, instance: &Json) -> Vec<String> {
    validator
        .iter_errors(instance)
        .map(|e| {
            let at = e.instance_path().to_string();
            if at.is_empty() {
                e.to_string()
            } else {
                format!("{} (at {})", e, at)
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::StaticSchemas;
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_cache_hit_skips_download() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plan.json"), br#"{"type":"object"}"#).unwrap();
        let fetcher = VendoredSchemas::new(dir.path());
        let bytes = fetcher
            .fetch("plan.json", "http://unreachable.invalid/plan.json")
            .unwrap();
        assert_eq!(bytes, br#"{"type":"object"}"#);
    }

    #[test]
    fn test_file_url_is_fetched_and_cached() {
        let src = tempdir().unwrap();
        let cache = tempdir().unwrap();
        let schema_path = src.path().join("task.json");
        fs::write(&schema_path, br#"{"type":"object"}"#).unwrap();
        let fetcher = VendoredSchemas::new(cache.path().join("schemas"));
        let url = format!("file://{}", schema_path.display());
        fetcher.fetch("task.json", &url).unwrap();
        assert!(cache.path().join("schemas/task.json").exists());
    }

    #[test]
    fn test_missing_source_is_download_error() {
        let cache = tempdir().unwrap();
        let fetcher = VendoredSchemas::new(cache.path());
        let err = fetcher
            .fetch("task.json", "file:///definitely/not/here/task.json")
            .unwrap_err();
        assert_eq!(err.name, "task.json");
    }

    #[test]
    fn test_malformed_schema_is_fatal() {
        let fetcher = StaticSchemas::with("plan.json", "{ not json");
        let err = load_validator(&fetcher, "plan.json", "u", "Plan Metadata")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Failed to parse Plan Metadata schema file.");
    }

    #[test]
    fn test_schema_errors_carry_instance_path() {
        let fetcher = StaticSchemas::with(
            "plan.json",
            r#"{"type":"object","properties":{"description":{"type":"string"}}}"#,
        );
        let v = load_validator(&fetcher, "plan.json", "u", "Plan Metadata").unwrap();
        assert!(schema_errors(&v, &json!({"description": "ok"})).is_empty());
        let errs = schema_errors(&v, &json!({"description": 5}));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("/description"));
    }
}
