//! Structural validation before scheduling.

use crate::error::ScheduleError;
use crate::models::{ScenarioId, TaskId};
use crate::project::Project;

struct Spans {
    duration: i64,
    length: i64,
    effort: i64,
    milestone: bool,
}

impl Spans {
    fn of(project: &Project, task: TaskId, sc: ScenarioId) -> Result<Self, ScheduleError> {
        Ok(Self {
            duration: project.task_duration(task, sc, "duration")?,
            length: project.task_duration(task, sc, "length")?,
            effort: project.task_duration(task, sc, "effort")?,
            milestone: project.task_bool(task, sc, "milestone")?,
        })
    }

    fn count(&self) -> usize {
        [self.duration > 0, self.length > 0, self.effort > 0]
            .iter()
            .filter(|&&set| set)
            .count()
    }

    fn has_span(&self) -> bool {
        self.count() > 0
    }
}

/// Reject tasks whose own constraints contradict each other.
pub fn pre_schedule_check(project: &Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    for task in project.task_ids() {
        let t = project.task_ref(task);
        let spans = Spans::of(project, task, sc)?;
        let fail = |reason: &str| Err(ScheduleError::determinacy(&t.id, reason));

        if !t.is_leaf() {
            if spans.has_span() {
                return fail("container task must not have a duration, length or effort");
            }
            if spans.milestone {
                return fail("container task cannot be a milestone");
            }
            continue;
        }
        if spans.milestone && spans.has_span() {
            return fail("milestone must not have a duration, length or effort");
        }
        if spans.count() > 1 {
            return fail("only one of duration, length and effort may be specified");
        }

        let start = project.task_attr(task, sc, "start")?;
        let end = project.task_attr(task, sc, "end")?;
        if start.is_provided() && end.is_provided() && spans.has_span() {
            return fail("start, end and a duration, length or effort are all fixed");
        }
        let (start, end) = (
            project.task_date(task, sc, "start")?,
            project.task_date(task, sc, "end")?,
        );
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ScheduleError::determinacy(
                    &t.id,
                    format!("start {} is after end {}", s, e),
                ));
            }
        }
        if spans.effort > 0 && project.allocations(task, sc).is_empty() {
            return fail("effort requires at least one resource allocation");
        }
    }
    Ok(())
}

/// Make sure every leaf task can be placed in isolation.
///
/// A leaf needs an anchor in its scheduling direction, plus a span, a
/// milestone flag or a fixed opposite end. A span together with a
/// user-fixed opposite end is over-constrained.
pub fn check_determination(project: &Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    for task in project.leaf_tasks() {
        let id = &project.task_ref(task).id;
        let spans = Spans::of(project, task, sc)?;
        let forward = project.task_bool(task, sc, "forward")?;
        let links = project.links(task, sc);
        let (anchor_key, other_key, anchored_by_links) = if forward {
            ("start", "end", !links.start_preds.is_empty())
        } else {
            ("end", "start", !links.end_succs.is_empty())
        };

        let anchor = project.task_attr(task, sc, anchor_key)?;
        if !anchor.is_set() && !anchored_by_links {
            return Err(ScheduleError::determinacy(
                id,
                format!("has no {} date and no dependency fixing it", anchor_key),
            ));
        }

        let other = project.task_attr(task, sc, other_key)?;
        if spans.has_span() && other.is_provided() {
            return Err(ScheduleError::determinacy(
                id,
                format!(
                    "is over-constrained: both a span and a fixed {} are given",
                    other_key
                ),
            ));
        }
        if !spans.has_span() && !spans.milestone && !other.is_set() {
            return Err(ScheduleError::determinacy(
                id,
                format!(
                    "is under-constrained: needs a duration, length, effort or {} date",
                    other_key
                ),
            ));
        }
    }
    Ok(())
}
