//! Display-independent coordinator state.
//!
//! Both display implementations keep one `Board` behind one mutex, so key
//! allocation, list edits, slot text updates and completion are serialized.

use super::{Callback, LifecycleEvent, ProgressError, SlotKey, LIST_PLACEHOLDER};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

pub(crate) use crate::utils::glyph;

pub(crate) struct Board {
    title: String,
    next_key: u64,
    slots: BTreeMap<SlotKey, String>,
    list: Vec<String>,
    finished: Vec<String>,
    callbacks: Vec<(LifecycleEvent, Callback)>,
    completed: bool,
}

impl Board {
    pub(crate) fn new(title: impl Into<String>) -> Self {
        Board {
            title: title.into(),
            next_key: 0,
            slots: BTreeMap::new(),
            list: Vec::new(),
            finished: Vec::new(),
            callbacks: Vec::new(),
            completed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), ProgressError> {
        if self.completed {
            Err(ProgressError::Completed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn acquire(&mut self) -> Result<SlotKey, ProgressError> {
        self.ensure_open()?;
        let key = SlotKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(key, String::new());
        Ok(key)
    }

    pub(crate) fn update(&mut self, key: SlotKey, text: &str) -> Result<(), ProgressError> {
        self.ensure_open()?;
        if let Some(slot) = self.slots.get_mut(&key) {
            *slot = text.to_string();
        }
        Ok(())
    }

    pub(crate) fn release(&mut self, key: SlotKey) -> Result<(), ProgressError> {
        self.ensure_open()?;
        self.slots.remove(&key);
        Ok(())
    }

    pub(crate) fn add_to_list(&mut self, label: &str) -> Result<(), ProgressError> {
        self.ensure_open()?;
        self.list.push(label.to_string());
        Ok(())
    }

    pub(crate) fn remove_from_list(&mut self, label: &str) -> Result<(), ProgressError> {
        self.ensure_open()?;
        if let Some(pos) = self.list.iter().position(|l| l == label) {
            let done = self.list.remove(pos);
            self.finished.push(done);
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, event: &str, cb: Callback) -> Result<(), ProgressError> {
        let ev = event.parse::<LifecycleEvent>()?;
        self.ensure_open()?;
        self.callbacks.push((ev, cb));
        Ok(())
    }

    /// Mark the board complete and hand back the callbacks to fire, `done`
    /// callbacks first. The caller runs them after releasing the lock.
    pub(crate) fn finish(&mut self, success: bool) -> Result<Vec<Callback>, ProgressError> {
        self.ensure_open()?;
        self.completed = true;
        let wanted = if success {
            LifecycleEvent::Success
        } else {
            LifecycleEvent::Error
        };
        let mut done = Vec::new();
        let mut outcome = Vec::new();
        for (ev, cb) in self.callbacks.drain(..) {
            if ev == LifecycleEvent::Done {
                done.push(cb);
            } else if ev == wanted {
                outcome.push(cb);
            }
        }
        done.extend(outcome);
        Ok(done)
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.completed
    }

    /// Banner with the labels currently in progress.
    pub(crate) fn headline(&self) -> String {
        render_title(&self.title, &self.list)
    }

    /// Banner naming everything that ran, for the settled line.
    pub(crate) fn final_headline(&self) -> String {
        let mut all = self.finished.clone();
        all.extend(self.list.iter().cloned());
        render_title(&self.title, &all)
    }

    /// Non-empty slot texts in key order.
    pub(crate) fn slot_lines(&self) -> Vec<String> {
        self.slots
            .values()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect()
    }
}

fn render_title(title: &str, labels: &[String]) -> String {
    if !title.contains(LIST_PLACEHOLDER) {
        return title.to_string();
    }
    let joined = if labels.is_empty() {
        "...".to_string()
    } else {
        labels.join(", ")
    };
    title.replace(LIST_PLACEHOLDER, &joined)
}

pub(crate) fn lock(board: &Mutex<Board>) -> MutexGuard<'_, Board> {
    match board.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_keys_are_monotonic_and_updates_ignore_unknown_keys() {
        let mut b = Board::new("banner");
        let k0 = b.acquire().unwrap();
        let k1 = b.acquire().unwrap();
        assert!(k1 > k0);
        b.update(k1, "second").unwrap();
        b.release(k1).unwrap();
        // released key: no-op, no error
        b.update(k1, "ghost").unwrap();
        b.update(k0, "first").unwrap();
        assert_eq!(b.slot_lines(), vec!["first".to_string()]);
    }

    #[test]
    fn test_list_placeholder_rendering() {
        let mut b = Board::new("Using 2 threads. Validating: {list}.");
        assert_eq!(b.headline(), "Using 2 threads. Validating: ....");
        b.add_to_list("Metadata syntax").unwrap();
        b.add_to_list("Plan metadata").unwrap();
        assert_eq!(
            b.headline(),
            "Using 2 threads. Validating: Metadata syntax, Plan metadata."
        );
        b.remove_from_list("Metadata syntax").unwrap();
        assert_eq!(b.headline(), "Using 2 threads. Validating: Plan metadata.");
        assert_eq!(
            b.final_headline(),
            "Using 2 threads. Validating: Metadata syntax, Plan metadata."
        );
    }

    #[test]
    fn test_finish_orders_done_first_and_filters_outcome() {
        let mut b = Board::new("x");
        let hits = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["error", "success", "done"] {
            let order = Arc::clone(&order);
            let hits = Arc::clone(&hits);
            b.register(
                name,
                Box::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    order.lock().unwrap().push(name);
                }),
            )
            .unwrap();
        }
        for cb in b.finish(true).unwrap() {
            cb();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(*order.lock().unwrap(), vec!["done", "success"]);
    }

    #[test]
    fn test_mutators_fail_after_finish() {
        let mut b = Board::new("x");
        let k = b.acquire().unwrap();
        b.finish(false).unwrap();
        assert_eq!(b.acquire(), Err(ProgressError::Completed));
        assert_eq!(b.update(k, "late"), Err(ProgressError::Completed));
        assert_eq!(b.add_to_list("late"), Err(ProgressError::Completed));
        assert!(b.finish(true).is_err());
        assert!(matches!(
            b.register("done", Box::new(|| {})),
            Err(ProgressError::Completed)
        ));
    }

    #[test]
    fn test_register_rejects_unknown_event_names() {
        let mut b = Board::new("x");
        let err = b.register("stopped", Box::new(|| {})).unwrap_err();
        assert_eq!(err, ProgressError::UnknownEvent("stopped".into()));
    }
}
