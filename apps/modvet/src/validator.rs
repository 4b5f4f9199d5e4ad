//! The validator contract and its two building blocks.
//!
//! - [`FileValidator`] turns a per-file [`Checker`] into a full validator:
//!   target resolution, invalid-target reporting, progress handling and
//!   one terminal event per target.
//! - [`ValidatorGroup`] chains validators that are ordered phases of one
//!   logical check and stops at the first phase that fails.
//!
//! Validators keep no mutable state of their own. Everything an invocation
//! needs (progress handles included) arrives through [`InvokeOptions`], so
//! the same validator can run on several workers at once.

use crate::error::FatalError;
use crate::models::Event;
use crate::progress::{Progress, ProgressError, ProgressHub, ProgressLease, SlotKey};
use crate::report::Report;
use crate::targets::{self, display_path, IgnoreRules, IgnoreSet, NamingRule};
use crate::{output, utils};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Read-only input to one validator invocation.
#[derive(Clone)]
pub struct InvokeOptions {
    pub root: PathBuf,
    pub parallel: bool,
    pub hub: Arc<ProgressHub>,
    /// The run's shared coordinator; set in parallel mode.
    pub shared: Option<Arc<dyn Progress>>,
    pub ignore: Arc<dyn IgnoreRules>,
    /// Validator name -> patterns replacing the declared ones.
    pub pattern_overrides: HashMap<String, Vec<String>>,
}

impl InvokeOptions {
    /// Serial options with no ignore rules and no overrides.
    pub fn new(root: impl Into<PathBuf>, hub: Arc<ProgressHub>) -> Self {
        InvokeOptions {
            root: root.into(),
            parallel: false,
            hub,
            shared: None,
            ignore: Arc::new(IgnoreSet::empty()),
            pattern_overrides: HashMap::new(),
        }
    }

    pub fn patterns_for(&self, name: &str, declared: &[String]) -> Vec<String> {
        self.pattern_overrides
            .get(name)
            .cloned()
            .unwrap_or_else(|| declared.to_vec())
    }
}

/// A checker for one category of files.
pub trait Validator: Send + Sync {
    /// Stable identity, used as the `source` of events.
    fn name(&self) -> &str;

    fn patterns(&self) -> Vec<String>;

    /// Full progress label.
    fn spinner_text(&self, targets: &[PathBuf]) -> String;

    /// Compact label for the shared in-progress list.
    fn short_spinner_text(&self, targets: &[PathBuf]) -> String;

    /// Run against the module, record events into `report` and return 0
    /// when nothing failed, non-zero otherwise.
    fn invoke(&self, report: &Report, opts: &InvokeOptions) -> Result<i32, FatalError>;
}

/// One observation produced by a checker for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: String,
    pub message: Option<String>,
    pub passed: bool,
}

impl Finding {
    pub fn ok() -> Self {
        Finding {
            severity: "ok".into(),
            message: None,
            passed: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Finding {
            severity: "error".into(),
            message: Some(message.into()),
            passed: false,
        }
    }

    /// A note that does not fail the target.
    pub fn warning(message: impl Into<String>) -> Self {
        Finding {
            severity: "warning".into(),
            message: Some(message.into()),
            passed: true,
        }
    }
}

/// Why a target could not be checked normally.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Recorded as a single failure event for the target.
    #[error("{0}")]
    Target(String),
    /// Aborts the whole run.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Category-specific check logic plugged into a [`FileValidator`].
pub trait Checker: Send + Sync {
    /// Per-invocation state, e.g. a compiled schema.
    type Session;

    /// Prepare an invocation. Runs once, before any target is checked and
    /// before any progress is shown.
    fn begin(&self) -> Result<Self::Session, FatalError>;

    fn check(&self, session: &Self::Session, target: &Path) -> Result<Vec<Finding>, CheckError>;
}

/// How a validator names its targets in the progress label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLabel {
    Files,
    Pattern,
}

pub struct FileValidator<C> {
    name: String,
    patterns: Vec<String>,
    label: String,
    short_label: String,
    target_label: TargetLabel,
    naming: Option<NamingRule>,
    checker: C,
}

impl<C: Checker> FileValidator<C> {
    pub fn new(
        name: impl Into<String>,
        patterns: &[&str],
        label: impl Into<String>,
        short_label: impl Into<String>,
        checker: C,
    ) -> Self {
        FileValidator {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            label: label.into(),
            short_label: short_label.into(),
            target_label: TargetLabel::Files,
            naming: None,
            checker,
        }
    }

    pub fn with_naming(mut self, rule: NamingRule) -> Self {
        self.naming = Some(rule);
        self
    }

    pub fn labelled_by(mut self, target_label: TargetLabel) -> Self {
        self.target_label = target_label;
        self
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }
}

impl<C: Checker> Validator for FileValidator<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn patterns(&self) -> Vec<String> {
        self.patterns.clone()
    }

    fn spinner_text(&self, targets: &[PathBuf]) -> String {
        let shown = match self.target_label {
            TargetLabel::Pattern => self.patterns.join(" "),
            TargetLabel::Files => targets
                .iter()
                .map(|t| utils::rel_to_wd(t))
                .collect::<Vec<_>>()
                .join(" "),
        };
        format!("{} ({})", self.label, shown)
    }

    fn short_spinner_text(&self, _targets: &[PathBuf]) -> String {
        self.short_label.clone()
    }

    fn invoke(&self, report: &Report, opts: &InvokeOptions) -> Result<i32, FatalError> {
        let patterns = opts.patterns_for(&self.name, &self.patterns);
        let set = targets::resolve(
            &opts.root,
            &patterns,
            opts.ignore.as_ref(),
            self.naming.as_ref(),
        );

        for bad in &set.invalid {
            report.add_event(Event::failure(
                display_path(&opts.root, &bad.path),
                &self.name,
                "error",
                bad.reason.clone(),
            ));
        }
        if set.valid.is_empty() {
            debug!("{}: no targets", self.name);
            return Ok(0);
        }

        let session = self.checker.begin()?;
        let slot = ProgressSlot::open(self, &set.valid, opts)?;
        info!("{}: checking {} target(s)", self.name, set.valid.len());

        let mut failed = !set.invalid.is_empty();
        for target in &set.valid {
            let file = display_path(&opts.root, target);
            let event = match self.checker.check(&session, target) {
                Ok(findings) => fold_findings(file, &self.name, findings),
                Err(CheckError::Target(message)) => {
                    Event::failure(file, &self.name, "error", message)
                }
                Err(CheckError::Fatal(e)) => return Err(e),
            };
            failed |= event.is_failure();
            report.add_event(event);
        }

        slot.close(!failed)?;
        Ok(if failed { 1 } else { 0 })
    }
}

/// Collapse a checker's findings into the one terminal event of a target.
fn fold_findings(file: String, source: &str, findings: Vec<Finding>) -> Event {
    let (failing, passing): (Vec<Finding>, Vec<Finding>) =
        findings.into_iter().partition(|f| !f.passed);
    let chosen = if failing.is_empty() { &passing } else { &failing };
    let severity = chosen
        .iter()
        .map(|f| f.severity.as_str())
        .max_by_key(|s| severity_rank(s))
        .unwrap_or("ok")
        .to_string();
    let message = chosen
        .iter()
        .filter_map(|f| f.message.as_deref())
        .collect::<Vec<_>>()
        .join("; ");

    if !failing.is_empty() {
        let message = if message.is_empty() {
            "check failed".to_string()
        } else {
            message
        };
        Event::failure(file, source, severity, message)
    } else if message.is_empty() {
        Event::passed(file, source)
    } else {
        Event::passed_with(file, source, severity, message)
    }
}

fn severity_rank(severity: &str) -> u8 {
    match severity {
        "error" => 3,
        "warning" | "warn" => 2,
        "ok" => 0,
        _ => 1,
    }
}

/// Progress owned by one invocation: a private coordinator in serial mode,
/// or a slot plus list label on the run's shared coordinator in parallel
/// mode. Released on every exit path.
enum ProgressSlot<'a> {
    Own(ProgressLease<'a>),
    Shared(SharedSlot),
}

struct SharedSlot {
    progress: Arc<dyn Progress>,
    hub: Arc<ProgressHub>,
    key: SlotKey,
    label: String,
    text: String,
    open: bool,
}

impl<'a> ProgressSlot<'a> {
    fn open(
        v: &dyn Validator,
        targets: &[PathBuf],
        opts: &'a InvokeOptions,
    ) -> Result<Self, ProgressError> {
        let text = v.spinner_text(targets);
        if !opts.parallel {
            return Ok(ProgressSlot::Own(opts.hub.start(text)?));
        }
        let progress = opts.shared.clone().ok_or(ProgressError::NoSharedDisplay)?;
        let label = v.short_spinner_text(targets);
        progress.add_to_list(&label)?;
        let key = progress.acquire_slot()?;
        let slot = SharedSlot {
            progress,
            hub: Arc::clone(&opts.hub),
            key,
            label,
            text,
            open: true,
        };
        slot.progress.update(key, &slot.text)?;
        Ok(ProgressSlot::Shared(slot))
    }

    fn close(self, success: bool) -> Result<(), ProgressError> {
        match self {
            ProgressSlot::Own(lease) => lease.finish(success),
            ProgressSlot::Shared(slot) => slot.close(success),
        }
    }
}

impl SharedSlot {
    fn close(mut self, success: bool) -> Result<(), ProgressError> {
        self.open = false;
        self.progress.release(self.key)?;
        self.progress.remove_from_list(&self.label)?;
        // Print our own line only once the shared display has settled.
        let hub = Arc::clone(&self.hub);
        let line = output::spinner_message(&self.text, success);
        self.progress
            .on("done", Box::new(move || hub.println(&line)))
    }
}

impl Drop for SharedSlot {
    fn drop(&mut self) {
        if self.open {
            let _ = self.progress.release(self.key);
            let _ = self.progress.remove_from_list(&self.label);
        }
    }
}

/// Ordered phases of one logical check, e.g. syntax before lint.
pub struct ValidatorGroup {
    name: String,
    short_label: String,
    members: Vec<Box<dyn Validator>>,
}

impl ValidatorGroup {
    pub fn new(
        name: impl Into<String>,
        short_label: impl Into<String>,
        members: Vec<Box<dyn Validator>>,
    ) -> Self {
        ValidatorGroup {
            name: name.into(),
            short_label: short_label.into(),
            members,
        }
    }

    pub fn members(&self) -> &[Box<dyn Validator>] {
        &self.members
    }
}

impl Validator for ValidatorGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn patterns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for p in self.members.iter().flat_map(|m| m.patterns()) {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }

    fn spinner_text(&self, targets: &[PathBuf]) -> String {
        self.members
            .iter()
            .map(|m| m.spinner_text(targets))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn short_spinner_text(&self, _targets: &[PathBuf]) -> String {
        self.short_label.clone()
    }

    /// Members run in declaration order; the first non-zero result stops
    /// the chain and becomes the group's result.
    fn invoke(&self, report: &Report, opts: &InvokeOptions) -> Result<i32, FatalError> {
        for member in &self.members {
            let code = member.invoke(report, opts)?;
            if code != 0 {
                debug!("{}: stopping after {} failed", self.name, member.name());
                return Ok(code);
            }
        }
        Ok(0)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::State;
    use crate::progress::test_support::memory_sink;
    use regex::Regex;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    fn quiet_hub() -> Arc<ProgressHub> {
        let (sink, _out) = memory_sink();
        Arc::new(ProgressHub::with_sink(false, sink))
    }

    #[test]
    fn test_one_event_per_target_in_resolution_order() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/c.json", "bad");
        write(dir.path(), "items/a.json", "ok");
        write(dir.path(), "items/b.json", "warn");
        let v = scripted("things", "items/*.json");
        let report = Report::new();
        let code = v.invoke(&report, &InvokeOptions::new(dir.path(), quiet_hub())).unwrap();
        assert_eq!(code, 1);

        let evs = report.events();
        let files: Vec<&str> = evs.iter().map(|e| e.file()).collect();
        assert_eq!(files, vec!["items/a.json", "items/b.json", "items/c.json"]);
        assert_eq!(evs[0].state(), State::Passed);
        assert_eq!(evs[1].state(), State::Passed);
        assert_eq!(evs[1].severity(), "warning");
        assert_eq!(evs[1].message(), Some("style nit"));
        assert_eq!(evs[2].state(), State::Failure);
        assert_eq!(evs[2].message(), Some("first; second"));
    }

    #[test]
    fn test_zero_targets_short_circuits_without_progress() {
        let dir = tempdir().unwrap();
        let (sink, out) = memory_sink();
        let hub = Arc::new(ProgressHub::with_sink(true, sink));
        let v = scripted("things", "items/*.json");
        let report = Report::new();
        let code = v.invoke(&report, &InvokeOptions::new(dir.path(), hub)).unwrap();
        assert_eq!(code, 0);
        assert!(report.is_empty());
        assert_eq!(v.checker().begins.load(Ordering::SeqCst), 0);
        assert!(out.contents().is_empty(), "no progress should be drawn");
    }

    #[test]
    fn test_invalid_targets_reported_before_checking() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/good.json", "ok");
        write(dir.path(), "items/Bad-Name.json", "ok");
        let v = scripted("things", "items/*.json").with_naming(NamingRule {
            regex: Regex::new("^[a-z]+$").unwrap(),
            message: "invalid name".into(),
        });
        let report = Report::new();
        let code = v.invoke(&report, &InvokeOptions::new(dir.path(), quiet_hub())).unwrap();
        assert_eq!(code, 1);
        assert_eq!(v.checker().calls.load(Ordering::SeqCst), 1);
        let evs = report.events();
        assert_eq!(evs.len(), 2);
        assert_eq!(evs[0].file(), "items/Bad-Name.json");
        assert_eq!(evs[0].message(), Some("invalid name"));
        assert!(evs[0].is_failure());
        assert!(!evs[1].is_failure());
    }

    #[test]
    fn test_only_invalid_targets_returns_zero_but_report_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("items/folder.json")).unwrap();
        let v = scripted("things", "items/*.json");
        let report = Report::new();
        let code = v.invoke(&report, &InvokeOptions::new(dir.path(), quiet_hub())).unwrap();
        assert_eq!(code, 0);
        assert_eq!(report.len(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_fatal_from_begin_records_nothing_and_frees_hub() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/a.json", "ok");
        let v = scripted_unloadable("things", "items/*.json");
        let hub = quiet_hub();
        let report = Report::new();
        let err = v
            .invoke(&report, &InvokeOptions::new(dir.path(), Arc::clone(&hub)))
            .unwrap_err();
        assert!(matches!(err, FatalError::Schema { .. }));
        assert!(report.is_empty());
        assert!(!hub.is_active());
    }

    #[test]
    fn test_fatal_mid_run_settles_progress() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/a.json", "ok");
        write(dir.path(), "items/b.json", "fatal");
        let (sink, out) = memory_sink();
        let hub = Arc::new(ProgressHub::with_sink(false, sink));
        let v = scripted("things", "items/*.json");
        let report = Report::new();
        let res = v.invoke(&report, &InvokeOptions::new(dir.path(), Arc::clone(&hub)));
        assert!(matches!(res, Err(FatalError::Config(_))));
        assert!(!hub.is_active());
        assert!(out.contents().contains('✖'));
    }

    #[test]
    fn test_parallel_without_shared_display_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/a.json", "ok");
        let mut opts = InvokeOptions::new(dir.path(), quiet_hub());
        opts.parallel = true;
        let res = scripted("things", "items/*.json").invoke(&Report::new(), &opts);
        assert!(matches!(
            res,
            Err(FatalError::Progress(ProgressError::NoSharedDisplay))
        ));
    }

    #[test]
    fn test_parallel_prints_own_line_after_shared_display_settles() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/a.json", "ok");
        let (sink, out) = memory_sink();
        let hub = Arc::new(ProgressHub::with_sink(false, sink));
        let lease = hub.start("Using 1 threads. Validating: {list}.").unwrap();
        let mut opts = InvokeOptions::new(dir.path(), Arc::clone(&hub));
        opts.parallel = true;
        opts.shared = Some(lease.handle());

        let code = scripted("things", "items/*.json")
            .invoke(&Report::new(), &opts)
            .unwrap();
        assert_eq!(code, 0);
        assert!(!out.contents().contains("Checking things"));
        lease.finish(true).unwrap();

        let text = out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("Validating: Things."));
        assert!(lines[2].contains("Checking things"));
    }

    #[test]
    fn test_group_stops_at_first_failing_phase() {
        let dir = tempdir().unwrap();
        write(dir.path(), "first/a.json", "bad");
        write(dir.path(), "second/a.json", "ok");
        let group = ValidatorGroup::new(
            "pair",
            "Pair",
            vec![
                Box::new(scripted("phase-one", "first/*.json")),
                Box::new(scripted("phase-two", "second/*.json")),
            ],
        );
        let report = Report::new();
        let code = group
            .invoke(&report, &InvokeOptions::new(dir.path(), quiet_hub()))
            .unwrap();
        assert_eq!(code, 1);
        assert!(report.events_from("phase-two").is_empty());
        assert_eq!(group.patterns(), vec!["first/*.json", "second/*.json"]);
    }

    #[test]
    fn test_pattern_override_replaces_declared_patterns() {
        let dir = tempdir().unwrap();
        write(dir.path(), "elsewhere/a.json", "ok");
        let mut opts = InvokeOptions::new(dir.path(), quiet_hub());
        opts.pattern_overrides
            .insert("things".into(), vec!["elsewhere/*.json".into()]);
        let report = Report::new();
        scripted("things", "items/*.json").invoke(&report, &opts).unwrap();
        assert_eq!(report.events()[0].file(), "elsewhere/a.json");
    }

    #[test]
    fn test_ignored_target_is_neither_checked_nor_reported() {
        let dir = tempdir().unwrap();
        write(dir.path(), "items/a.json", "ok");
        write(dir.path(), "items/b.json", "bad");
        let mut opts = InvokeOptions::new(dir.path(), quiet_hub());
        opts.ignore = Arc::new(IgnoreSet::from_lines(["items/b.json"]).unwrap());
        let v = scripted("things", "items/*.json");
        let report = Report::new();
        let code = v.invoke(&report, &opts).unwrap();
        assert_eq!(code, 0);
        assert_eq!(v.checker().calls.load(Ordering::SeqCst), 1);
        let evs = report.events();
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].file(), "items/a.json");
        assert!(evs.iter().all(|e| e.file() != "items/b.json"));
    }
}
