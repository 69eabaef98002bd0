//! Error types for scheduling and reporting.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised while preparing, scheduling or finishing a scenario.
///
/// Everything except `Configuration` and `OutOfRange` is scenario-fatal: it
/// aborts the remainder of the failing scenario's pipeline. Runaway tasks are
/// never reported through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Date {date} is out of project time range ({start} - {end})")]
    OutOfRange {
        date: NaiveDateTime,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Task {task} references unknown task {target}")]
    UnknownReference { task: String, target: String },
    #[error("Dependency loop detected: {0}")]
    Cycle(String),
    #[error("Task {task}: {reason}")]
    Determinacy { task: String, reason: String },
    #[error("Task {task} failed post-scheduling check: {reason}")]
    PostCheck { task: String, reason: String },
}

impl ScheduleError {
    pub(crate) fn determinacy(task: &str, reason: impl Into<String>) -> Self {
        ScheduleError::Determinacy {
            task: task.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn post_check(task: &str, reason: impl Into<String>) -> Self {
        ScheduleError::PostCheck {
            task: task.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable message identifier used when forwarding to the message handler.
    pub fn message_id(&self) -> &'static str {
        match self {
            ScheduleError::Configuration(_) => "configuration",
            ScheduleError::OutOfRange { .. } => "out_of_range",
            ScheduleError::UnknownReference { .. } => "unknown_reference",
            ScheduleError::Cycle(_) => "loop_detected",
            ScheduleError::Determinacy { .. } => "undetermined",
            ScheduleError::PostCheck { .. } => "post_check",
        }
    }
}

/// Errors raised while generating reports. Independent of scheduling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Report {report} failed: {reason}")]
    Generation { report: String, reason: String },
    #[error("Report {0} requires a scheduled scenario")]
    NotScheduled(String),
}
