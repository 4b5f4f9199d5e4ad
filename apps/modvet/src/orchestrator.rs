//! Runs a set of validators against one module, serially or on a worker
//! pool, and folds their results into one exit status.

use crate::error::FatalError;
use crate::progress::ProgressHub;
use crate::report::Report;
use crate::targets::{IgnoreRules, IgnoreSet};
use crate::validator::{InvokeOptions, Validator};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings for one run.
#[derive(Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub parallel: bool,
    pub ignore: Arc<dyn IgnoreRules>,
    pub pattern_overrides: HashMap<String, Vec<String>>,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RunOptions {
            root: root.into(),
            parallel: false,
            ignore: Arc::new(IgnoreSet::empty()),
            pattern_overrides: HashMap::new(),
        }
    }
}

pub struct Orchestrator {
    validators: Vec<Box<dyn Validator>>,
    hub: Arc<ProgressHub>,
}

impl Orchestrator {
    pub fn new(validators: Vec<Box<dyn Validator>>, hub: Arc<ProgressHub>) -> Self {
        Orchestrator { validators, hub }
    }

    /// Run every validator and return the run's exit status: 0 when all
    /// passed, 1 when any validator or recorded event failed.
    ///
    /// Independent validators never stop each other. A fatal error aborts
    /// the run; in parallel mode the remaining workers finish first and the
    /// first fatal error is returned.
    pub fn run(&self, report: &Report, opts: &RunOptions) -> Result<i32, FatalError> {
        let mut invoke = InvokeOptions::new(opts.root.clone(), Arc::clone(&self.hub));
        invoke.ignore = Arc::clone(&opts.ignore);
        invoke.pattern_overrides = opts.pattern_overrides.clone();

        let code = if opts.parallel && !self.validators.is_empty() {
            self.run_parallel(report, invoke)?
        } else {
            self.run_serial(report, &invoke)?
        };
        info!(events = report.len(), code, "run finished");
        Ok(code.max(report.exit_code()))
    }

    fn run_serial(&self, report: &Report, invoke: &InvokeOptions) -> Result<i32, FatalError> {
        let mut code = 0;
        for v in &self.validators {
            debug!("invoking {}", v.name());
            code |= v.invoke(report, invoke)?;
        }
        Ok(code)
    }

    fn run_parallel(&self, report: &Report, mut invoke: InvokeOptions) -> Result<i32, FatalError> {
        let threads = self.validators.len();
        let lease = self
            .hub
            .start(format!("Using {} threads. Validating: {{list}}.", threads))?;
        invoke.parallel = true;
        invoke.shared = Some(lease.handle());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("modvet-worker-{}", i))
            .build()?;
        debug!(threads, "dispatching validators");
        let results: Vec<Result<i32, FatalError>> = pool.install(|| {
            self.validators
                .par_iter()
                .map(|v| v.invoke(report, &invoke))
                .collect()
        });

        let mut code = 0;
        let mut fatal = None;
        for r in results {
            match r {
                Ok(c) => code |= c,
                Err(e) => {
                    fatal.get_or_insert(e);
                }
            }
        }
        let settled = lease.finish(code == 0 && fatal.is_none());
        if let Some(e) = fatal {
            return Err(e);
        }
        settled?;
        Ok(code)
    }
}
