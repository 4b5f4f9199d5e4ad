//! Append-only, thread-safe collection of validation events.
//!
//! One `Report` is created per run and shared by every validator, including
//! validators running concurrently on the worker pool. Appends take a single
//! lock; readers get a cloned snapshot so no caller ever sees a torn event.

use crate::models::{Event, Summary};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct Report {
    events: Mutex<Vec<Event>>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event. Existing events are never touched.
    pub fn add_event(&self, event: Event) {
        self.lock().push(event);
    }

    /// Ordered snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Events produced by one validator, in the order it recorded them.
    pub fn events_from(&self, source: &str) -> Vec<Event> {
        self.lock()
            .iter()
            .filter(|e| e.source() == source)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 1 when any event failed, whatever its severity string; 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.lock().iter().any(Event::is_failure) {
            1
        } else {
            0
        }
    }

    pub fn summary(&self) -> Summary {
        let events = self.lock();
        let mut summary = Summary::default();
        let mut files: BTreeSet<&str> = BTreeSet::new();
        for ev in events.iter() {
            files.insert(ev.file());
            if ev.is_failure() {
                summary.failures += 1;
                match ev.severity() {
                    "warning" | "warn" => summary.warnings += 1,
                    _ => summary.errors += 1,
                }
            } else {
                summary.passed += 1;
                if matches!(ev.severity(), "warning" | "warn") {
                    summary.warnings += 1;
                }
            }
        }
        summary.files = files.len();
        summary
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        // A validator thread that panicked mid-run must not hide the events
        // it already recorded.
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
