//! Per-scenario preparation: link resolution, validation and criticality.
//!
//! Phases run in a fixed order and the first failure aborts the rest:
//! 1. Reset resource and task scheduling state
//! 2. Resolve explicit dependencies into links
//! 3. Derive implicit anchors and directions
//! 4. Propagate inheritable values down the trees
//! 5. Structural pre-checks
//! 6. Loop detection along successor links
//! 7. Loop detection along predecessor links
//! 8. Determinacy check
//! 9. Allocation counting and criticality scoring

pub mod checks;
pub mod criticality;
pub mod cycles;
pub mod graph;
pub mod xref;

use crate::error::ScheduleError;
use crate::models::ScenarioId;
use crate::project::Project;
use crate::scoreboard::Scoreboard;
use crate::{log_checks, log_debug};

pub use cycles::Direction;

/// Prepares one scenario of a project for the priority scheduler.
pub struct DependencyResolver<'a> {
    project: &'a mut Project,
    scenario: ScenarioId,
    verbosity: u8,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(project: &'a mut Project, scenario: ScenarioId, verbosity: u8) -> Self {
        Self {
            project,
            scenario,
            verbosity,
        }
    }

    /// Run all phases against a fresh scoreboard.
    pub fn resolve(&mut self, sb: &Scoreboard) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        let name = self.project.scenario_ref(sc).id.clone();

        log_debug!(self.verbosity, "[{}] Resetting scheduling state", name);
        self.prepare(sb);

        log_debug!(self.verbosity, "[{}] Resolving dependencies", name);
        xref::xref(self.project, sc)?;
        xref::implicit_xref(self.project, sc)?;
        xref::propagate_initial_values(self.project, sc)?;

        log_debug!(self.verbosity, "[{}] Checking task constraints", name);
        checks::pre_schedule_check(self.project, sc)?;
        cycles::detect_cycles(self.project, sc, Direction::Successors)?;
        cycles::detect_cycles(self.project, sc, Direction::Predecessors)?;
        checks::check_determination(self.project, sc)?;

        log_debug!(self.verbosity, "[{}] Computing criticalness", name);
        criticality::count_allocations(self.project, sc)?;
        criticality::resource_criticalness(self.project, sc)?;
        criticality::task_criticalness(self.project, sc)?;
        criticality::path_criticalness(self.project, sc)?;

        log_checks!(
            self.verbosity,
            "[{}] Prepared {} tasks and {} resources",
            name,
            self.project.tasks.len(),
            self.project.resources.len()
        );
        Ok(())
    }

    fn prepare(&mut self, sb: &Scoreboard) {
        let sc = self.scenario;
        for resource in self.project.resource_ids().collect::<Vec<_>>() {
            self.project.prepare_resource_scheduling(resource, sc, sb);
        }
        for task in self.project.task_ids().collect::<Vec<_>>() {
            self.project.prepare_task_scheduling(task, sc);
        }
    }
}
