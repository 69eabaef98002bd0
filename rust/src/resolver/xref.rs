//! Link resolution and initial value propagation.

use crate::attributes::{AttributeSchema, AttributeValue, PropertyAttributes, Provenance};
use crate::error::ScheduleError;
use crate::models::{Dependency, Link, Links, ScenarioId, TaskId};
use crate::project::Project;

enum Edge {
    StartPred,
    StartSucc,
    EndPred,
    EndSucc,
}

fn push_link(project: &mut Project, task: TaskId, sc: ScenarioId, edge: Edge, link: Link) {
    let links = &mut project.tasks[task.index()].scenarios[sc.index()].links;
    let list = match edge {
        Edge::StartPred => &mut links.start_preds,
        Edge::StartSucc => &mut links.start_succs,
        Edge::EndPred => &mut links.end_preds,
        Edge::EndSucc => &mut links.end_succs,
    };
    Links::push_unique(list, link);
}

/// `depends` and `precedes` of a task and all of its ancestors.
fn inherited_dependencies(
    project: &Project,
    task: TaskId,
    sc: ScenarioId,
) -> (Vec<Dependency>, Vec<Dependency>) {
    let mut depends = Vec::new();
    let mut precedes = Vec::new();
    let mut cursor = Some(task);
    while let Some(t) = cursor {
        depends.extend_from_slice(project.depends(t, sc));
        precedes.extend_from_slice(project.precedes(t, sc));
        cursor = project.tasks[t.index()].parent;
    }
    (depends, precedes)
}

fn resolve_target(project: &Project, task: TaskId, dep: &Dependency) -> Result<TaskId, ScheduleError> {
    project
        .task(&dep.target)
        .ok_or_else(|| ScheduleError::UnknownReference {
            task: project.task_ref(task).id.clone(),
            target: dep.target.clone(),
        })
}

/// Turn dependency identifiers into links in both directions.
pub fn xref(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    let mut pending: Vec<(TaskId, Edge, Link)> = Vec::new();
    for task in project.task_ids() {
        let (depends, precedes) = inherited_dependencies(project, task, sc);
        for dep in &depends {
            let target = resolve_target(project, task, dep)?;
            let on_end = dep.on_end.unwrap_or(true);
            pending.push((
                task,
                Edge::StartPred,
                Link {
                    task: target,
                    on_end,
                    gap: dep.gap,
                },
            ));
            let back = if on_end { Edge::EndSucc } else { Edge::StartSucc };
            pending.push((
                target,
                back,
                Link {
                    task,
                    on_end: false,
                    gap: dep.gap,
                },
            ));
        }
        for dep in &precedes {
            let target = resolve_target(project, task, dep)?;
            let on_end = dep.on_end.unwrap_or(false);
            pending.push((
                task,
                Edge::EndSucc,
                Link {
                    task: target,
                    on_end,
                    gap: dep.gap,
                },
            ));
            let back = if on_end { Edge::EndPred } else { Edge::StartPred };
            pending.push((
                target,
                back,
                Link {
                    task,
                    on_end: true,
                    gap: dep.gap,
                },
            ));
        }
    }
    for (task, edge, link) in pending {
        push_link(project, task, sc, edge, link);
    }
    Ok(())
}

/// Derive anchors and directions the user left implicit.
///
/// A leaf with a fixed end but no start and no start predecessor is
/// scheduled backward. Root tasks without an anchor in their direction take
/// the project bound.
pub fn implicit_xref(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    let (Some(project_start), Some(project_end)) = (project.start(), project.end()) else {
        return Err(ScheduleError::Configuration(
            "project start and end must be set before scheduling".to_string(),
        ));
    };

    for task in project.task_ids() {
        if !project.task_ref(task).is_leaf() {
            continue;
        }
        let end = project.task_attr(task, sc, "end")?;
        let start = project.task_attr(task, sc, "start")?;
        let forward = project.task_attr(task, sc, "forward")?;
        if end.is_provided()
            && !start.is_set()
            && !forward.is_provided()
            && project.links(task, sc).start_preds.is_empty()
        {
            project.task_set(task, sc, "forward", AttributeValue::Boolean(false), Provenance::Inherited)?;
        }
    }

    for task in project.root_tasks() {
        let links = project.links(task, sc);
        let (no_start_preds, no_end_succs) = (links.start_preds.is_empty(), links.end_succs.is_empty());
        if project.task_bool(task, sc, "forward")? {
            if no_start_preds && !project.task_attr(task, sc, "start")?.is_set() {
                project.task_set(
                    task,
                    sc,
                    "start",
                    AttributeValue::Date(Some(project_start)),
                    Provenance::Inherited,
                )?;
            }
        } else if no_end_succs && !project.task_attr(task, sc, "end")?.is_set() {
            project.task_set(
                task,
                sc,
                "end",
                AttributeValue::Date(Some(project_end)),
                Provenance::Inherited,
            )?;
        }
    }
    Ok(())
}

/// Copy inheritable scenario values from parents into unset child slots.
pub(crate) fn inherit_from_parent(
    schema: &AttributeSchema,
    parent: &PropertyAttributes,
    child: &mut PropertyAttributes,
    scenario: usize,
    skip: &[&str],
    scenario_specific: bool,
) -> Result<(), ScheduleError> {
    for (idx, def) in schema.iter() {
        if !def.inheritable || def.scenario_specific != scenario_specific || skip.contains(&def.id) {
            continue;
        }
        let from = parent.get_idx(schema, idx, scenario)?;
        if !from.is_set() || child.get_idx(schema, idx, scenario)?.is_set() {
            continue;
        }
        let value = from.value.clone();
        child.set_idx(schema, idx, scenario, value, Provenance::Inherited)?;
    }
    Ok(())
}

/// Push inheritable scenario values down the task and resource trees.
///
/// `start` does not reach tasks with start predecessors, `end` does not
/// reach tasks with end successors.
pub fn propagate_initial_values(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    for task in project.tasks_top_down() {
        let Some(parent) = project.tasks[task.index()].parent else {
            continue;
        };
        let links = project.links(task, sc);
        let mut skip = Vec::new();
        if !links.start_preds.is_empty() {
            skip.push("start");
        }
        if !links.end_succs.is_empty() {
            skip.push("end");
        }
        let from = project.tasks[parent.index()].attributes.clone();
        inherit_from_parent(
            &project.task_schema,
            &from,
            &mut project.tasks[task.index()].attributes,
            sc.index(),
            &skip,
            true,
        )?;
    }

    for resource in resources_top_down(project) {
        let Some(parent) = project.resources[resource.index()].parent else {
            continue;
        };
        let from = project.resources[parent.index()].attributes.clone();
        inherit_from_parent(
            &project.resource_schema,
            &from,
            &mut project.resources[resource.index()].attributes,
            sc.index(),
            &[],
            true,
        )?;
    }
    Ok(())
}

/// Push shared inheritable values down both property trees.
pub fn propagate_shared_values(project: &mut Project) -> Result<(), ScheduleError> {
    for task in project.tasks_top_down() {
        let Some(parent) = project.tasks[task.index()].parent else {
            continue;
        };
        let from = project.tasks[parent.index()].attributes.clone();
        let attrs = &mut project.tasks[task.index()].attributes;
        attrs.reset_inherited_shared(&project.task_schema);
        inherit_from_parent(
            &project.task_schema,
            &from,
            attrs,
            0,
            &[],
            false,
        )?;
    }
    for resource in resources_top_down(project) {
        let Some(parent) = project.resources[resource.index()].parent else {
            continue;
        };
        let from = project.resources[parent.index()].attributes.clone();
        let attrs = &mut project.resources[resource.index()].attributes;
        attrs.reset_inherited_shared(&project.resource_schema);
        inherit_from_parent(
            &project.resource_schema,
            &from,
            attrs,
            0,
            &[],
            false,
        )?;
    }
    Ok(())
}

fn resources_top_down(project: &Project) -> Vec<crate::models::ResourceId> {
    let mut order = Vec::with_capacity(project.resources.len());
    let mut stack: Vec<_> = project
        .resource_ids()
        .filter(|r| project.resources[r.index()].parent.is_none())
        .collect();
    stack.reverse();
    while let Some(resource) = stack.pop() {
        order.push(resource);
        stack.extend(project.resources[resource.index()].children.iter().rev().copied());
    }
    order
}
