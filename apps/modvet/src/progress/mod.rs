//! Shared live-progress display for validators.
//!
//! A run owns at most one coordinator at a time (see [`ProgressHub`]). The
//! coordinator holds a banner line plus one independently updatable slot per
//! running validator, and an in-progress list rendered into the banner's
//! `{list}` placeholder. Every mutation goes through one lock; renderers
//! work from a snapshot taken under that lock and write outside it.
//!
//! Two implementations share the [`Progress`] capability set:
//! - [`SpinnerBoard`]: interactive terminals, redraws in place from a timer
//!   thread.
//! - [`PlainBoard`]: pipes and CI logs, one start line and one final line.

mod board;
mod hub;
mod plain;
mod spinner;

pub use hub::{stderr_sink, ProgressHub, ProgressLease, Sink};
pub use plain::PlainBoard;
pub use spinner::SpinnerBoard;

use std::str::FromStr;
use thiserror::Error;

/// Placeholder in a board title that is replaced by the in-progress list.
pub const LIST_PLACEHOLDER: &str = "{list}";

/// Handle to one progress slot. Keys are unique per coordinator and grow
/// monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(u64);

/// Terminal lifecycle points a callback can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Done,
    Success,
    Error,
}

impl FromStr for LifecycleEvent {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches(':') {
            "done" => Ok(LifecycleEvent::Done),
            "success" => Ok(LifecycleEvent::Success),
            "error" => Ok(LifecycleEvent::Error),
            other => Err(ProgressError::UnknownEvent(other.to_string())),
        }
    }
}

pub type Callback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("a progress display is already active")]
    AlreadyActive,
    #[error("the progress display has already completed")]
    Completed,
    #[error("the event :{0} does not exist; only :done, :success, and :error are allowed")]
    UnknownEvent(String),
    #[error("parallel mode requires a shared progress display")]
    NoSharedDisplay,
}

/// Capability set shared by the interactive and degraded displays.
pub trait Progress: Send + Sync {
    /// Allocate a fresh slot key.
    fn acquire_slot(&self) -> Result<SlotKey, ProgressError>;

    /// Replace the text of a slot. Unknown or released keys are ignored.
    fn update(&self, key: SlotKey, text: &str) -> Result<(), ProgressError>;

    /// Drop a slot from the display.
    fn release(&self, key: SlotKey) -> Result<(), ProgressError>;

    /// Append a short label to the in-progress list.
    fn add_to_list(&self, label: &str) -> Result<(), ProgressError>;

    /// Remove one occurrence of `label` from the in-progress list.
    fn remove_from_list(&self, label: &str) -> Result<(), ProgressError>;

    /// Terminal transition: settle the display and fire callbacks.
    fn complete(&self, success: bool) -> Result<(), ProgressError>;

    /// Register a callback for `done`, `success` or `error`.
    fn on(&self, event: &str, callback: Callback) -> Result<(), ProgressError>;

    fn is_complete(&self) -> bool;
}
