//! Shared data models for validation results and the module manifest.

pub mod metadata;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Terminal state of one (file, validator) observation.
pub enum State {
    Passed,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One immutable observation about one target, produced by one validator.
///
/// Fields are private so an `Event` cannot be changed once it is recorded;
/// use the accessors to read it back.
pub struct Event {
    file: String,
    source: String,
    state: State,
    severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Event {
    /// A passing event with severity `ok`.
    pub fn passed(file: impl Into<String>, source: impl Into<String>) -> Self {
        Event {
            file: file.into(),
            source: source.into(),
            state: State::Passed,
            severity: "ok".into(),
            message: None,
        }
    }

    /// A passing event that still carries a note, e.g. a style warning.
    pub fn passed_with(
        file: impl Into<String>,
        source: impl Into<String>,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event {
            file: file.into(),
            source: source.into(),
            state: State::Passed,
            severity: severity.into(),
            message: Some(message.into()),
        }
    }

    /// A failing event. Failures always carry a message.
    pub fn failure(
        file: impl Into<String>,
        source: impl Into<String>,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event {
            file: file.into(),
            source: source.into(),
            state: State::Failure,
            severity: severity.into(),
            message: Some(message.into()),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_failure(&self) -> bool {
        self.state == State::Failure
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Aggregated counts used by printers.
pub struct Summary {
    pub passed: usize,
    pub failures: usize,
    pub errors: usize,
    pub warnings: usize,
    pub files: usize,
}
