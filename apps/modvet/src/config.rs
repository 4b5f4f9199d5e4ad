//! Configuration discovery and effective settings resolution.
//!
//! modvet reads `modvet.toml|yaml|yml` from the module root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `parallel`: false
//! - `ignore`: none (a `.modvetignore` file is always honored)
//! - `schemas.cache_dir`: `.modvet/schemas`
//! - `schemas.task|plan`: the forge schema service
//! - `validators.<name>.patterns`: the validator's built-in patterns
//!
//! Patterns use `glob` syntax (`*`, `**`, `?`, `[...]`). Brace alternation
//! such as `plans/{a,b}.json` is not supported and is reported as an invalid
//! pattern; list each alternative as its own entry instead.
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::schema::{DEFAULT_CACHE_DIR, DEFAULT_PLAN_SCHEMA_URL, DEFAULT_TASK_SCHEMA_URL};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILES: [&str; 3] = ["modvet.toml", "modvet.yaml", "modvet.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Root configuration loaded from `modvet.toml|yaml`.
pub struct ModvetConfig {
    pub output: Option<String>,
    pub parallel: Option<bool>,
    #[serde(default)]
    pub ignore: Option<Vec<String>>,
    #[serde(default)]
    pub schemas: Option<SchemasCfg>,
    #[serde(default)]
    pub validators: Option<HashMap<String, ValidatorCfg>>, // [validators.<name>].patterns
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Schema locations under `[schemas]`.
pub struct SchemasCfg {
    pub cache_dir: Option<String>,
    pub task: Option<String>,
    pub plan: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ValidatorCfg {
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub output: String,
    pub parallel: bool,
    pub ignore: Vec<String>,
    pub cache_dir: PathBuf,
    pub task_schema_url: String,
    pub plan_schema_url: String,
    pub pattern_overrides: HashMap<String, Vec<String>>, // validator -> patterns
}

/// Walk upward from `start` to detect the module root.
///
/// `start` is made absolute first, so relative paths (including `.`) walk
/// past the current directory. Stops when a `modvet.toml|yaml|yml` or a
/// `.git` directory is found; otherwise the absolute `start` is returned.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let start = absolute_dir(start);
    let mut cur = start.as_path();
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start,
        }
    }
}

fn absolute_dir(start: &Path) -> PathBuf {
    let start = if start.as_os_str().is_empty() {
        Path::new(".")
    } else {
        start
    };
    fs::canonicalize(start)
        .or_else(|_| std::path::absolute(start))
        .unwrap_or_else(|_| start.to_path_buf())
}

/// Load `ModvetConfig` from `modvet.toml` or `modvet.yaml|yml` if present.
///
/// A config file that exists but does not parse is an error rather than
/// being silently replaced by defaults.
pub fn load_config(root: &Path) -> Result<Option<ModvetConfig>> {
    let toml_path = root.join("modvet.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path)
            .with_context(|| format!("reading {}", toml_path.display()))?;
        let cfg: ModvetConfig =
            toml::from_str(&s).with_context(|| format!("parsing {}", toml_path.display()))?;
        return Ok(Some(cfg));
    }
    for yml in ["modvet.yaml", "modvet.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
            let cfg: ModvetConfig =
                serde_yaml::from_str(&s).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_parallel: Option<bool>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        bail!("unsupported output mode '{}' (expected human or json)", output);
    }

    let parallel = cli_parallel.or(cfg.parallel).unwrap_or(false);
    let ignore = cfg.ignore.unwrap_or_default();

    let schemas = cfg.schemas.unwrap_or_default();
    let cache_dir = repo_root.join(schemas.cache_dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR));
    let task_schema_url = schemas
        .task
        .unwrap_or_else(|| DEFAULT_TASK_SCHEMA_URL.to_string());
    let plan_schema_url = schemas
        .plan
        .unwrap_or_else(|| DEFAULT_PLAN_SCHEMA_URL.to_string());

    let pattern_overrides = cfg
        .validators
        .unwrap_or_default()
        .into_iter()
        .map(|(name, ov)| (name, ov.patterns))
        .collect::<HashMap<_, _>>();

    Ok(Effective {
        repo_root,
        config_found,
        output,
        parallel,
        ignore,
        cache_dir,
        task_schema_url,
        plan_schema_url,
        pattern_overrides,
    })
}
