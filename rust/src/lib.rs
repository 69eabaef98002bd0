//! Scenario-based project scheduling core.
//!
//! Tasks, resources and scenarios are held in a [`Project`]. Scheduling a
//! project resolves dependencies, places leaf tasks slot by slot on a
//! time-slot scoreboard, derives container spans and checks the result for
//! every enabled scenario.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

pub mod logging;

pub mod attributes;
pub mod calendar;
mod config;
pub mod coordinator;
mod error;
mod finalizer;
mod interner;
pub mod messages;
pub mod models;
mod project;
pub mod report;
pub mod resolver;
mod resource_schedule;
pub mod scheduler;
pub mod scoreboard;
pub mod sorting;
mod task_scheduling;

#[cfg(feature = "python")]
mod python;

pub use attributes::{AttributeValue, Provenance};
pub use calendar::{Interval, WorkingHours};
pub use config::SchedulingConfig;
pub use coordinator::{RunReport, ScenarioOutcome, ScenarioResult};
pub use error::{ReportError, ScheduleError};
pub use messages::{Level, Message, MessageHandler};
pub use models::{Allocation, Dependency, ResourceId, ScenarioId, TaskId};
pub use project::Project;
pub use report::{Report, TaskListReport};
pub use scheduler::{CancellationToken, Placement, ScheduleOutcome};
