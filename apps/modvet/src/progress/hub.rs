//! Ownership of the single active coordinator and the shared output sink.

use super::{PlainBoard, Progress, ProgressError, SpinnerBoard};
use std::io::Write;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Output shared by the display and every message printed around it.
pub type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

pub fn stderr_sink() -> Sink {
    Arc::new(Mutex::new(Box::new(std::io::stderr())))
}

fn lock_sink(sink: &Sink) -> MutexGuard<'_, Box<dyn Write + Send>> {
    match sink.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Write `text` as-is. Display output is best effort; write errors are
/// dropped.
pub(crate) fn write_raw(sink: &Sink, text: &str) {
    let mut w = lock_sink(sink);
    let _ = w.write_all(text.as_bytes());
    let _ = w.flush();
}

pub(crate) fn write_line(sink: &Sink, text: &str) {
    let mut w = lock_sink(sink);
    let _ = writeln!(w, "{}", text);
    let _ = w.flush();
}

/// Creates coordinators for one run and enforces that only one is active.
pub struct ProgressHub {
    interactive: bool,
    sink: Sink,
    active: Mutex<Option<Arc<dyn Progress>>>,
}

impl ProgressHub {
    /// Hub writing to stderr.
    pub fn new(interactive: bool) -> Self {
        Self::with_sink(interactive, stderr_sink())
    }

    pub fn with_sink(interactive: bool, sink: Sink) -> Self {
        ProgressHub {
            interactive,
            sink,
            active: Mutex::new(None),
        }
    }

    pub fn sink(&self) -> Sink {
        Arc::clone(&self.sink)
    }

    /// Print one line through the shared sink.
    pub fn println(&self, text: &str) {
        write_line(&self.sink, text);
    }

    /// Start a coordinator titled `title`.
    ///
    /// Fails with [`ProgressError::AlreadyActive`] while another coordinator
    /// from this hub has not completed.
    pub fn start(&self, title: impl Into<String>) -> Result<ProgressLease<'_>, ProgressError> {
        let mut active = self.lock_active();
        if let Some(current) = active.as_ref() {
            if !current.is_complete() {
                return Err(ProgressError::AlreadyActive);
            }
        }
        let title = title.into();
        debug!(interactive = self.interactive, "starting progress: {}", title);
        let progress: Arc<dyn Progress> = if self.interactive {
            Arc::new(SpinnerBoard::start(title, self.sink()))
        } else {
            Arc::new(PlainBoard::start(title, self.sink()))
        };
        *active = Some(Arc::clone(&progress));
        Ok(ProgressLease {
            hub: self,
            progress,
        })
    }

    /// The active, not yet completed coordinator, if any.
    pub fn current(&self) -> Option<Arc<dyn Progress>> {
        self.lock_active()
            .as_ref()
            .filter(|p| !p.is_complete())
            .cloned()
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    fn clear(&self, progress: &Arc<dyn Progress>) {
        let mut active = self.lock_active();
        if active
            .as_ref()
            .map(|cur| Arc::ptr_eq(cur, progress))
            .unwrap_or(false)
        {
            *active = None;
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Arc<dyn Progress>>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Scoped ownership of the active coordinator.
///
/// Dropping a lease that was never completed completes it as an error, so a
/// fatal abort still settles the display and frees the hub.
pub struct ProgressLease<'a> {
    hub: &'a ProgressHub,
    progress: Arc<dyn Progress>,
}

impl ProgressLease<'_> {
    /// Shareable handle for workers.
    pub fn handle(&self) -> Arc<dyn Progress> {
        Arc::clone(&self.progress)
    }

    pub fn finish(self, success: bool) -> Result<(), ProgressError> {
        self.progress.complete(success)
    }
}

impl Deref for ProgressLease<'_> {
    type Target = dyn Progress;

    fn deref(&self) -> &Self::Target {
        self.progress.as_ref()
    }
}

impl Drop for ProgressLease<'_> {
    fn drop(&mut self) {
        if !self.progress.is_complete() {
            let _ = self.progress.complete(false);
        }
        self.hub.clear(&self.progress);
    }
}
