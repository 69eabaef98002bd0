//! Allocation counting and criticality scores.

use std::collections::VecDeque;

use crate::attributes::{AttributeValue, Provenance};
use crate::error::ScheduleError;
use crate::models::ScenarioId;
use crate::project::Project;

use super::graph::{start_node, EventGraph};

/// Spread each leaf task's effort evenly over the candidates of each of its
/// allocations and accumulate it on the resources.
pub fn count_allocations(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    let mut allocated = vec![0.0_f64; project.resources.len()];
    for task in project.leaf_tasks() {
        let effort = project.task_duration(task, sc, "effort")? as f64;
        if effort <= 0.0 {
            continue;
        }
        for allocation in project.allocations(task, sc) {
            if allocation.candidates.is_empty() {
                continue;
            }
            let share = effort / allocation.candidates.len() as f64;
            for &r in &allocation.candidates {
                allocated[r.index()] += share;
            }
        }
    }
    for resource in project.resource_ids().collect::<Vec<_>>() {
        project.resource_set(
            resource,
            sc,
            "alloctdeffort",
            AttributeValue::Float(allocated[resource.index()]),
            Provenance::Computed,
        )?;
    }
    Ok(())
}

/// Allocated effort over free working time. Above 1.0 means overbooked.
///
/// Resources without any working time divide by one second.
pub fn resource_criticalness(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    for resource in project.resource_ids().collect::<Vec<_>>() {
        let allocated = project.resource_float(resource, sc, "alloctdeffort")?;
        let free = project.resource_ref(resource).scenarios[sc.index()]
            .schedule
            .free_capacity()
            .max(1) as f64;
        project.resource_set(
            resource,
            sc,
            "criticalness",
            AttributeValue::Float(allocated / free),
            Provenance::Computed,
        )?;
    }
    Ok(())
}

/// Effort in working days times the mean criticalness of all candidates.
pub fn task_criticalness(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    for task in project.leaf_tasks() {
        let effort = project.task_duration(task, sc, "effort")?;
        let days = project.convert_to_daily_load(effort as f64);
        let mut sum = 0.0;
        let mut count = 0usize;
        for allocation in project.allocations(task, sc) {
            for &r in &allocation.candidates {
                sum += project.resource_float(r, sc, "criticalness")?;
                count += 1;
            }
        }
        let criticalness = if effort > 0 && count > 0 && days.is_finite() {
            days * (sum / count as f64)
        } else {
            0.0
        };
        project.task_set(
            task,
            sc,
            "criticalness",
            AttributeValue::Float(criticalness),
            Provenance::Computed,
        )?;
    }
    Ok(())
}

/// Order the event graph with Kahn's algorithm, earlier events first.
fn topological_sort(graph: &EventGraph) -> Option<Vec<usize>> {
    let mut in_degree = vec![0usize; graph.len()];
    for edges in &graph.edges {
        for &to in edges {
            in_degree[to] += 1;
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(node, _)| node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &to in &graph.edges[node] {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                queue.push_back(to);
            }
        }
    }

    (order.len() == graph.len()).then_some(order)
}

/// Longest criticalness path starting at each task.
///
/// Crossing a task from its start to its end costs the task's criticalness,
/// every other edge is free. A task's path criticalness is the heaviest path
/// leaving its start node, so work that gates critical successors ranks
/// higher.
pub fn path_criticalness(project: &mut Project, sc: ScenarioId) -> Result<(), ScheduleError> {
    let graph = EventGraph::successors(project, sc);
    let order = topological_sort(&graph).ok_or_else(|| {
        ScheduleError::Cycle("dependency graph is not acyclic".to_string())
    })?;

    let mut weight = vec![0.0_f64; graph.len()];
    for task in project.task_ids() {
        weight[start_node(task)] = project.task_float(task, sc, "criticalness")?;
    }

    let mut value = vec![0.0_f64; graph.len()];
    for &node in order.iter().rev() {
        let best = graph.edges[node]
            .iter()
            .map(|&to| {
                // start(T) -> end(T)
                let edge = if node % 2 == 0 && to == node + 1 {
                    weight[node]
                } else {
                    0.0
                };
                edge + value[to]
            })
            .fold(0.0_f64, f64::max);
        value[node] = best;
    }

    for task in project.task_ids().collect::<Vec<_>>() {
        project.task_set(
            task,
            sc,
            "pathcriticalness",
            AttributeValue::Float(value[start_node(task)]),
            Provenance::Computed,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Allocation, Dependency};
    use crate::resolver::xref::xref;
    use chrono::{NaiveDate, NaiveDateTime};

    fn d(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    const HOUR: i64 = 3600;

    #[test]
    fn test_effort_spreads_over_candidates() {
        let mut project = Project::new("p", "Project");
        project.set_bounds(d(2024, 1, 1), d(2024, 1, 8));
        let sc = project.scenario("plan").unwrap();
        let r1 = project.add_resource("r1", "R1", None).unwrap();
        let r2 = project.add_resource("r2", "R2", None).unwrap();
        let t = project.add_task("t", "T", None).unwrap();
        project
            .set_task_attr(t, sc, "effort", AttributeValue::Duration(16 * HOUR))
            .unwrap();
        project.add_allocation(t, sc, Allocation::new(vec![r1, r2]));
        let sb = project.scoreboard().unwrap();
        project.prepare_resource_scheduling(r1, sc, &sb);
        project.prepare_resource_scheduling(r2, sc, &sb);

        count_allocations(&mut project, sc).unwrap();
        assert_eq!(project.resource_float(r1, sc, "alloctdeffort").unwrap(), 8.0 * HOUR as f64);

        resource_criticalness(&mut project, sc).unwrap();
        // Five working days of eight hours in the first week of 2024
        let r1_crit = project.resource_float(r1, sc, "criticalness").unwrap();
        assert!((r1_crit - 0.2).abs() < 1e-9, "{}", r1_crit);

        task_criticalness(&mut project, sc).unwrap();
        let t_crit = project.task_float(t, sc, "criticalness").unwrap();
        assert!((t_crit - 0.4).abs() < 1e-9, "{}", t_crit);
    }

    #[test]
    fn test_path_criticalness_follows_successors() {
        let mut project = Project::new("p", "Project");
        let sc = project.scenario("plan").unwrap();
        let a = project.add_task("a", "A", None).unwrap();
        let b = project.add_task("b", "B", None).unwrap();
        let c = project.add_task("c", "C", None).unwrap();
        project.add_dependency(b, sc, Dependency::new("a"));
        xref(&mut project, sc).unwrap();
        for (task, crit) in [(a, 1.0), (b, 2.0), (c, 5.0)] {
            project
                .task_set(task, sc, "criticalness", AttributeValue::Float(crit), Provenance::Computed)
                .unwrap();
        }

        path_criticalness(&mut project, sc).unwrap();
        assert_eq!(project.task_float(a, sc, "pathcriticalness").unwrap(), 3.0);
        assert_eq!(project.task_float(b, sc, "pathcriticalness").unwrap(), 2.0);
        assert_eq!(project.task_float(c, sc, "pathcriticalness").unwrap(), 5.0);
    }

    #[test]
    fn test_topological_sort_rejects_loops() {
        let graph = EventGraph {
            edges: vec![vec![1], vec![0]],
        };
        assert!(topological_sort(&graph).is_none());

        let chain = EventGraph {
            edges: vec![vec![1], vec![2], vec![]],
        };
        assert_eq!(topological_sort(&chain), Some(vec![0, 1, 2]));
    }
}
