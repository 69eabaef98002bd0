//! Greedy priority scheduler for the leaf tasks of one scenario.
//!
//! Every pass scans the ready tasks in their fixed order. The first task with
//! a candidate slot inside the project locks a group of
//! `(slot, priority, path criticalness, direction)`; following tasks may join
//! the group only while they rank at least as high and share the direction
//! (milestones have none). Each member gets one attempt at the locked slot.
//! As soon as an attempt changes what other tasks can observe, the ready set
//! is rebuilt and a new pass starts. The loop ends when a pass finds no slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::ScheduleError;
use crate::models::{ScenarioId, TaskId};
use crate::project::Project;
use crate::scoreboard::Scoreboard;
use crate::sorting::{sort_leaf_tasks, WorkItem};
use crate::{log_changes, log_checks, log_debug};

/// Cooperative cancellation signal shared between the caller and a run.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A task that got completely scheduled, in completion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub task: TaskId,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// What a scheduler run did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleOutcome {
    pub placements: Vec<Placement>,
    pub runaways: Vec<TaskId>,
    pub cancelled: bool,
    pub passes: usize,
}

#[derive(Clone, Copy, Debug)]
struct Group {
    slot: NaiveDateTime,
    priority: i64,
    path_criticalness: f64,
    forward: bool,
}

enum PassResult {
    /// An attempt changed task state; rebuild the ready set.
    Changed,
    /// A group was locked and its members advanced.
    Advanced,
    /// No ready task had a usable slot.
    Idle,
    Cancelled,
}

pub struct PriorityScheduler<'a> {
    project: &'a mut Project,
    scenario: ScenarioId,
    verbosity: u8,
}

impl<'a> PriorityScheduler<'a> {
    pub fn new(project: &'a mut Project, scenario: ScenarioId, verbosity: u8) -> Self {
        Self {
            project,
            scenario,
            verbosity,
        }
    }

    /// Run the greedy loop until no task can make progress.
    ///
    /// Cancellation is not an error: whatever was placed so far stays.
    pub fn run(
        &mut self,
        sb: &Scoreboard,
        cancel: &CancellationToken,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let sc = self.scenario;
        let items = sort_leaf_tasks(self.project, sc)?;
        let max_passes = (items.len() + 1) * (sb.size() + 2) * 2;
        let mut outcome = ScheduleOutcome::default();
        let mut ready = self.ready_items(&items, sb)?;

        log_checks!(
            self.verbosity,
            "Scheduling {} leaf tasks, {} ready",
            items.len(),
            ready.len()
        );

        loop {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            if outcome.passes >= max_passes {
                let scenario = self.project.scenario_ref(sc).id.clone();
                self.project.messages.warning(
                    "scheduler_stalled",
                    format!("Scheduler stopped after {} passes", outcome.passes),
                    Some(&scenario),
                    None,
                );
                break;
            }
            outcome.passes += 1;

            match self.pass(&ready, sb, cancel, &mut outcome)? {
                PassResult::Changed => ready = self.ready_items(&items, sb)?,
                PassResult::Advanced => {}
                PassResult::Idle => break,
                PassResult::Cancelled => {
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        log_changes!(
            self.verbosity,
            "Scheduled {} tasks in {} passes ({} runaway{})",
            outcome.placements.len(),
            outcome.passes,
            outcome.runaways.len(),
            if outcome.cancelled { ", cancelled" } else { "" }
        );
        Ok(outcome)
    }

    fn ready_items(&self, items: &[WorkItem], sb: &Scoreboard) -> Result<Vec<WorkItem>, ScheduleError> {
        let mut ready = Vec::new();
        for item in items {
            if self.project.is_ready_for_scheduling(item.task, self.scenario, sb)? {
                ready.push(item.clone());
            }
        }
        Ok(ready)
    }

    fn pass(
        &mut self,
        ready: &[WorkItem],
        sb: &Scoreboard,
        cancel: &CancellationToken,
        outcome: &mut ScheduleOutcome,
    ) -> Result<PassResult, ScheduleError> {
        let sc = self.scenario;
        let mut group: Option<Group> = None;

        for item in ready {
            if cancel.is_cancelled() {
                return Ok(PassResult::Cancelled);
            }
            let group_now = match group {
                Some(g) => {
                    if !item.fits_group(g.priority, g.path_criticalness, g.forward) {
                        log_checks!(
                            self.verbosity,
                            "  Deferring {} (priority={}, pathcrit={:.3}) behind group at {}",
                            self.project.task_ref(item.task).id,
                            item.priority,
                            item.path_criticalness,
                            g.slot
                        );
                        break;
                    }
                    g
                }
                None => {
                    let Some(slot) = self.project.next_candidate_slot(item.task, sc, sb)? else {
                        continue;
                    };
                    if !sb.contains_slot(slot) {
                        self.runaway(item.task, slot, outcome);
                        continue;
                    }
                    let g = Group {
                        slot,
                        priority: item.priority,
                        path_criticalness: item.path_criticalness,
                        forward: item.forward,
                    };
                    log_checks!(
                        self.verbosity,
                        "  Group at {} (priority={}, pathcrit={:.3}, {})",
                        slot,
                        g.priority,
                        g.path_criticalness,
                        if g.forward { "forward" } else { "backward" }
                    );
                    group = Some(g);
                    g
                }
            };

            log_debug!(
                self.verbosity,
                "    Attempting {} at {}",
                self.project.task_ref(item.task).id,
                group_now.slot
            );
            if self.project.attempt_schedule(item.task, sc, group_now.slot, sb)? {
                self.record_placement(item.task, outcome)?;
                return Ok(PassResult::Changed);
            }
        }

        Ok(if group.is_some() {
            PassResult::Advanced
        } else {
            PassResult::Idle
        })
    }

    fn runaway(&mut self, task: TaskId, slot: NaiveDateTime, outcome: &mut ScheduleOutcome) {
        let sc = self.scenario;
        if !self.project.mark_runaway(task, sc) {
            return;
        }
        outcome.runaways.push(task);
        let id = self.project.task_ref(task).id.clone();
        let scenario = self.project.scenario_ref(sc).id.clone();
        log_changes!(
            self.verbosity,
            "  Runaway: {} wants slot {} outside the project",
            id,
            slot
        );
        self.project.messages.warning(
            "runaway",
            format!("Task {} does not fit into the project time frame ({})", id, slot),
            Some(&scenario),
            Some(&id),
        );
    }

    fn record_placement(&mut self, task: TaskId, outcome: &mut ScheduleOutcome) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        if !self.project.work(task, sc).scheduled {
            return Ok(());
        }
        let placement = Placement {
            task,
            start: self.project.task_date(task, sc, "start")?,
            end: self.project.task_date(task, sc, "end")?,
        };
        log_changes!(
            self.verbosity,
            "  Placed {}: {:?} - {:?}",
            self.project.task_ref(task).id,
            placement.start,
            placement.end
        );
        outcome.placements.push(placement);
        Ok(())
    }
}
