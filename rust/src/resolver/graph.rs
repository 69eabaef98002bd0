//! Start/end event graph over the task tree and its dependency links.
//!
//! Every task contributes two nodes, its start and its end. Node `2 * i` is
//! the start of task `i`, node `2 * i + 1` its end.

use crate::models::{Link, ScenarioId, TaskId};
use crate::project::Project;

#[inline]
pub fn start_node(task: TaskId) -> usize {
    task.index() * 2
}

#[inline]
pub fn end_node(task: TaskId) -> usize {
    task.index() * 2 + 1
}

#[inline]
pub fn node_task(node: usize) -> TaskId {
    TaskId::from_index(node / 2)
}

fn link_node(link: &Link) -> usize {
    if link.on_end {
        end_node(link.task)
    } else {
        start_node(link.task)
    }
}

/// Adjacency lists of the event graph in one traversal direction.
#[derive(Debug, Clone)]
pub struct EventGraph {
    pub edges: Vec<Vec<usize>>,
}

impl EventGraph {
    /// Edges pointing from earlier events to later ones, built from
    /// successor links.
    pub fn successors(project: &Project, sc: ScenarioId) -> Self {
        let mut edges = vec![Vec::new(); project.tasks.len() * 2];
        for task in project.task_ids() {
            let t = project.task_ref(task);
            let links = project.links(task, sc);
            let start = &mut edges[start_node(task)];
            start.push(end_node(task));
            start.extend(t.children.iter().map(|&c| start_node(c)));
            start.extend(links.start_succs.iter().map(link_node));

            let end = &mut edges[end_node(task)];
            end.extend(links.end_succs.iter().map(link_node));
            if let Some(parent) = t.parent {
                end.push(end_node(parent));
            }
        }
        Self { edges }
    }

    /// Edges pointing from later events to earlier ones, built from
    /// predecessor links.
    pub fn predecessors(project: &Project, sc: ScenarioId) -> Self {
        let mut edges = vec![Vec::new(); project.tasks.len() * 2];
        for task in project.task_ids() {
            let t = project.task_ref(task);
            let links = project.links(task, sc);
            let end = &mut edges[end_node(task)];
            end.push(start_node(task));
            end.extend(t.children.iter().map(|&c| end_node(c)));
            end.extend(links.end_preds.iter().map(link_node));

            let start = &mut edges[start_node(task)];
            start.extend(links.start_preds.iter().map(link_node));
            if let Some(parent) = t.parent {
                start.push(start_node(parent));
            }
        }
        Self { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Human readable name of a node, e.g. `build.end`.
    pub fn node_name(project: &Project, node: usize) -> String {
        let side = if node % 2 == 0 { "start" } else { "end" };
        format!("{}.{}", project.task_ref(node_task(node)).id, side)
    }
}
