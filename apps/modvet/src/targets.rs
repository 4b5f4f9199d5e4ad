//! Target resolution: expand category patterns against the module tree.
//!
//! Every path matched by a pattern lands in exactly one of three buckets:
//! - `valid`: handed to the checker.
//! - `skipped`: excluded by ignore rules; never reported.
//! - `invalid`: not a file, unreadable, or failing the category's naming
//!   rule; reported as a failure before any checker logic runs.
//!
//! Buckets are sorted by path so reports are reproducible across runs.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-module ignore file read by [`IgnoreSet::load`].
pub const IGNORE_FILE: &str = ".modvetignore";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTarget {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct TargetSet {
    pub valid: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub invalid: Vec<InvalidTarget>,
}

/// Source of ignore decisions. Paths are relative to the module root.
pub trait IgnoreRules: Send + Sync {
    fn is_ignored(&self, rel: &Path) -> bool;
}

/// Ignore rules compiled from config patterns and the module ignore file.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    set: GlobSet,
    len: usize,
}

impl IgnoreSet {
    pub fn empty() -> Self {
        IgnoreSet {
            set: GlobSet::empty(),
            len: 0,
        }
    }

    /// Compile gitignore-style lines (comments and blank lines allowed).
    pub fn from_lines<I, S>(lines: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut b = GlobSetBuilder::new();
        let mut len = 0;
        for line in lines {
            for glob in expand_ignore_line(line.as_ref()) {
                b.add(GlobBuilder::new(&glob).literal_separator(true).build()?);
                len += 1;
            }
        }
        Ok(IgnoreSet {
            set: b.build()?,
            len,
        })
    }

    /// Combine `extra` patterns (from config) with `<root>/.modvetignore`.
    pub fn load(root: &Path, extra: &[String]) -> Result<Self, globset::Error> {
        let mut lines: Vec<String> = extra.to_vec();
        if let Ok(s) = fs::read_to_string(root.join(IGNORE_FILE)) {
            lines.extend(s.lines().map(str::to_string));
        }
        let set = Self::from_lines(lines)?;
        debug!(globs = set.len, "compiled ignore rules");
        Ok(set)
    }
}

impl IgnoreRules for IgnoreSet {
    fn is_ignored(&self, rel: &Path) -> bool {
        self.set.is_match(rel)
    }
}

/// Translate one gitignore-style line into globs.
///
/// `/x` anchors at the root, `x/` matches only directories (and so their
/// contents), a name without a slash matches at any depth. Negations are
/// not supported and are dropped.
fn expand_ignore_line(line: &str) -> Vec<String> {
    let l = line.trim();
    if l.is_empty() || l.starts_with('#') || l.starts_with('!') {
        return Vec::new();
    }
    let dir_only = l.ends_with('/');
    let l = l.trim_end_matches('/');
    let anchored = l.starts_with('/') || l.contains('/');
    let l = l.trim_start_matches('/');
    if l.is_empty() {
        return Vec::new();
    }
    let base = if anchored {
        l.to_string()
    } else {
        format!("**/{}", l)
    };
    if base.ends_with("**") {
        return vec![base];
    }
    let mut out = vec![format!("{}/**", base)];
    if !dir_only {
        out.push(base);
    }
    out
}

/// Naming convention a category imposes on its file stems.
#[derive(Debug, Clone)]
pub struct NamingRule {
    pub regex: Regex,
    pub message: String,
}

impl NamingRule {
    pub fn accepts(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| self.regex.is_match(s))
            .unwrap_or(false)
    }
}

/// Resolve `patterns` (relative to `root`) into a partitioned target set.
pub fn resolve(
    root: &Path,
    patterns: &[String],
    ignore: &dyn IgnoreRules,
    naming: Option<&NamingRule>,
) -> TargetSet {
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };
    let mut matched: BTreeSet<PathBuf> = BTreeSet::new();
    let mut invalid: BTreeMap<PathBuf, String> = BTreeMap::new();
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());

    for pat in patterns {
        // glob has no `{a,b}` alternation; refuse instead of matching nothing.
        if pat.contains('{') || pat.contains('}') {
            invalid
                .entry(PathBuf::from(pat))
                .or_insert_with(|| "invalid pattern: brace alternation is not supported".into());
            continue;
        }
        let pattern = format!("{}/{}", escaped_root.trim_end_matches('/'), pat);
        let paths = match glob::glob(&pattern) {
            Ok(p) => p,
            Err(e) => {
                invalid
                    .entry(PathBuf::from(pat))
                    .or_insert_with(|| format!("invalid pattern: {}", e));
                continue;
            }
        };
        for entry in paths {
            match entry {
                Ok(p) => {
                    matched.insert(p);
                }
                Err(e) => {
                    invalid
                        .entry(e.path().to_path_buf())
                        .or_insert_with(|| "could not be read".to_string());
                }
            }
        }
    }

    let mut set = TargetSet::default();
    for path in matched {
        if invalid.contains_key(&path) {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if ignore.is_ignored(rel) {
            set.skipped.push(path);
            continue;
        }
        if !path.is_file() {
            invalid.insert(path, "not a file".into());
            continue;
        }
        if fs::File::open(&path).is_err() {
            invalid.insert(path, "could not be read".into());
            continue;
        }
        if let Some(rule) = naming {
            if !rule.accepts(&path) {
                invalid.insert(path, rule.message.clone());
                continue;
            }
        }
        set.valid.push(path);
    }
    set.invalid = invalid
        .into_iter()
        .map(|(path, reason)| InvalidTarget { path, reason })
        .collect();
    debug!(
        valid = set.valid.len(),
        skipped = set.skipped.len(),
        invalid = set.invalid.len(),
        "resolved {:?}",
        patterns
    );
    set
}

/// Path relative to `root` with `/` separators, as recorded in events.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "{}").unwrap();
    }

    fn names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| display_path(root, p)).collect()
    }

    #[test]
    fn test_partition_is_exact_and_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "tasks/zeta.json");
        touch(root, "tasks/alpha.json");
        touch(root, "tasks/Bad-Name.json");
        touch(root, "tasks/old.json");
        fs::create_dir_all(root.join("tasks/folder.json")).unwrap();

        let ignore = IgnoreSet::from_lines(["/tasks/old.json"]).unwrap();
        let naming = NamingRule {
            regex: Regex::new("^[a-z][a-z0-9_]*$").unwrap(),
            message: "bad name".into(),
        };
        let set = resolve(root, &["tasks/*.json".to_string()], &ignore, Some(&naming));

        assert_eq!(names(root, &set.valid), vec!["tasks/alpha.json", "tasks/zeta.json"]);
        assert_eq!(names(root, &set.skipped), vec!["tasks/old.json"]);
        let invalid: Vec<(String, String)> = set
            .invalid
            .iter()
            .map(|i| (display_path(root, &i.path), i.reason.clone()))
            .collect();
        assert_eq!(
            invalid,
            vec![
                ("tasks/Bad-Name.json".to_string(), "bad name".to_string()),
                ("tasks/folder.json".to_string(), "not a file".to_string()),
            ]
        );

        let mut all: Vec<String> = names(root, &set.valid);
        all.extend(names(root, &set.skipped));
        all.extend(invalid.into_iter().map(|(p, _)| p));
        let unique: BTreeSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), all.len(), "buckets overlap");
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_overlapping_patterns_are_deduplicated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "plans/init.json");
        let set = resolve(
            root,
            &["plans/*.json".to_string(), "plans/init.json".to_string()],
            &IgnoreSet::empty(),
            None,
        );
        assert_eq!(set.valid.len(), 1);
    }

    #[test]
    fn test_malformed_selector_is_invalid() {
        let dir = tempdir().unwrap();
        let set = resolve(
            dir.path(),
            &["plans/[.json".to_string()],
            &IgnoreSet::empty(),
            None,
        );
        assert!(set.valid.is_empty());
        assert_eq!(set.invalid.len(), 1);
        assert_eq!(set.invalid[0].path, PathBuf::from("plans/[.json"));
        assert!(set.invalid[0].reason.starts_with("invalid pattern"));
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let dir = tempdir().unwrap();
        let set = resolve(
            dir.path(),
            &["plans/*.json".to_string()],
            &IgnoreSet::empty(),
            None,
        );
        assert!(set.valid.is_empty() && set.skipped.is_empty() && set.invalid.is_empty());
    }

    #[test]
    fn test_brace_alternation_is_invalid() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "plans/a.json");
        let set = resolve(
            dir.path(),
            &["plans/{a,b}.json".to_string(), "plans/*.json".to_string()],
            &IgnoreSet::empty(),
            None,
        );
        assert_eq!(names(dir.path(), &set.valid), vec!["plans/a.json"]);
        assert_eq!(set.invalid.len(), 1);
        assert_eq!(set.invalid[0].path, PathBuf::from("plans/{a,b}.json"));
        assert!(set.invalid[0].reason.contains("brace alternation"));
    }

    #[test]
    fn test_empty_root_means_current_dir() {
        // Tests run from the package directory.
        let set = resolve(
            Path::new(""),
            &["Cargo.toml".to_string()],
            &IgnoreSet::empty(),
            None,
        );
        assert_eq!(set.valid.len(), 1);
        assert!(set.valid[0].ends_with("Cargo.toml"));
        assert!(set.invalid.is_empty());
    }

    #[test]
    fn test_ignore_file_lines() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join(IGNORE_FILE),
            "# fixtures are generated\nfixtures/\n*.bak.json\n/plans/legacy.json\n",
        )
        .unwrap();
        let set = IgnoreSet::load(root, &["vendor/**".to_string()]).unwrap();
        assert!(set.is_ignored(Path::new("spec/fixtures/plans/a.json")));
        assert!(set.is_ignored(Path::new("plans/x.bak.json")));
        assert!(set.is_ignored(Path::new("plans/legacy.json")));
        assert!(set.is_ignored(Path::new("vendor/mod/metadata.json")));
        assert!(!set.is_ignored(Path::new("sub/plans/legacy.json")));
        assert!(!set.is_ignored(Path::new("plans/init.json")));
    }
}
