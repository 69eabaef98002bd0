//! Scheduling order of leaf tasks.

use std::cmp::Ordering;

use crate::error::ScheduleError;
use crate::models::{ScenarioId, TaskId};
use crate::project::Project;

/// The scheduler's view of a leaf task for one scenario pass.
///
/// Captured once before the loop starts; the order never changes during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub task: TaskId,
    pub priority: i64,
    pub path_criticalness: f64,
    pub seq: usize,
    pub forward: bool,
    pub milestone: bool,
}

impl WorkItem {
    pub fn capture(project: &Project, task: TaskId, sc: ScenarioId) -> Result<Self, ScheduleError> {
        Ok(Self {
            task,
            priority: project.task_int(task, sc, "priority")?,
            path_criticalness: project.task_float(task, sc, "pathcriticalness")?,
            seq: project.task_ref(task).seq,
            forward: project.task_bool(task, sc, "forward")?,
            milestone: project.task_bool(task, sc, "milestone")?,
        })
    }

    /// Whether this item may join a group locked by `lead`.
    ///
    /// Milestones join regardless of direction.
    pub fn fits_group(&self, priority: i64, path_criticalness: f64, forward: bool) -> bool {
        if !self.milestone && self.forward != forward {
            return false;
        }
        if self.priority < priority {
            return false;
        }
        !(self.priority == priority && self.path_criticalness < path_criticalness)
    }
}

/// Compare two f64 values, treating NaN as equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Eq for WorkItem {}

impl Ord for WorkItem {
    /// Priority descending, then path criticalness descending, then
    /// sequence number ascending.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(cmp_f64(other.path_criticalness, self.path_criticalness))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Capture and sort all leaf tasks of a scenario.
pub fn sort_leaf_tasks(project: &Project, sc: ScenarioId) -> Result<Vec<WorkItem>, ScheduleError> {
    let mut items = project
        .leaf_tasks()
        .into_iter()
        .map(|task| WorkItem::capture(project, task, sc))
        .collect::<Result<Vec<_>, _>>()?;
    items.sort();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(task: u32, priority: i64, path_criticalness: f64, seq: usize) -> WorkItem {
        WorkItem {
            task: TaskId(task),
            priority,
            path_criticalness,
            seq,
            forward: true,
            milestone: false,
        }
    }

    #[test]
    fn test_priority_then_criticalness_then_seq() {
        let mut items = vec![
            item(0, 500, 1.0, 1),
            item(1, 700, 0.0, 2),
            item(2, 500, 3.0, 3),
            item(3, 500, 1.0, 0),
        ];
        items.sort();
        let order: Vec<u32> = items.iter().map(|i| i.task.0).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_nan_criticalness_ties() {
        let a = item(0, 500, f64::NAN, 1);
        let b = item(1, 500, 2.0, 2);
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_fits_group() {
        let lead = item(0, 500, 2.0, 1);
        let (p, c, f) = (lead.priority, lead.path_criticalness, lead.forward);

        assert!(item(1, 500, 2.0, 2).fits_group(p, c, f));
        assert!(!item(1, 400, 9.0, 2).fits_group(p, c, f));
        assert!(!item(1, 500, 1.0, 2).fits_group(p, c, f));

        let mut backward = item(2, 500, 2.0, 3);
        backward.forward = false;
        assert!(!backward.fits_group(p, c, f));
        backward.milestone = true;
        assert!(backward.fits_group(p, c, f));
    }

    #[test]
    fn test_sort_leaf_tasks_skips_containers() {
        let mut project = Project::new("p", "Project");
        let parent = project.add_task("parent", "Parent", None).unwrap();
        let a = project.add_task("a", "A", Some(parent)).unwrap();
        let b = project.add_task("b", "B", Some(parent)).unwrap();
        let sc = project.scenario("plan").unwrap();
        project
            .set_task_attr(b, sc, "priority", crate::attributes::AttributeValue::Integer(600))
            .unwrap();

        let order: Vec<TaskId> = sort_leaf_tasks(&project, sc)
            .unwrap()
            .into_iter()
            .map(|i| i.task)
            .collect();
        assert_eq!(order, vec![b, a]);
    }
}
