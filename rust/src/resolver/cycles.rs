//! Dependency loop detection on the event graph.

use crate::error::ScheduleError;
use crate::models::ScenarioId;
use crate::project::Project;

use super::graph::{end_node, start_node, EventGraph};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Which links a loop search follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Successor links, starting at the start of every root task.
    Successors,
    /// Predecessor links, starting at the end of every root task.
    Predecessors,
}

/// Search for a dependency loop in one direction.
///
/// Uses an iterative three-color depth-first search; the color array is
/// fresh for every call. The error names the nodes forming the loop.
pub fn detect_cycles(
    project: &Project,
    sc: ScenarioId,
    direction: Direction,
) -> Result<(), ScheduleError> {
    let graph = match direction {
        Direction::Successors => EventGraph::successors(project, sc),
        Direction::Predecessors => EventGraph::predecessors(project, sc),
    };
    let roots: Vec<usize> = project
        .root_tasks()
        .into_iter()
        .map(|t| match direction {
            Direction::Successors => start_node(t),
            Direction::Predecessors => end_node(t),
        })
        .collect();

    let mut color = vec![Color::White; graph.len()];
    for root in roots {
        if color[root] != Color::White {
            continue;
        }
        // (node, index of the next edge to follow)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        color[root] = Color::Gray;
        while let Some(top) = stack.last_mut() {
            let (node, edge) = *top;
            top.1 += 1;
            let Some(&target) = graph.edges[node].get(edge) else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };
            match color[target] {
                Color::White => {
                    color[target] = Color::Gray;
                    stack.push((target, 0));
                }
                Color::Gray => {
                    let from = stack.iter().position(|&(n, _)| n == target).unwrap_or(0);
                    let mut path: Vec<String> = stack[from..]
                        .iter()
                        .map(|&(n, _)| EventGraph::node_name(project, n))
                        .collect();
                    path.push(EventGraph::node_name(project, target));
                    return Err(ScheduleError::Cycle(path.join(" -> ")));
                }
                Color::Black => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, Link};
    use crate::resolver::xref::xref;

    #[test]
    fn test_mutual_dependency_is_a_loop() {
        let mut project = Project::new("p", "Project");
        let a = project.add_task("a", "A", None).unwrap();
        let b = project.add_task("b", "B", None).unwrap();
        let sc = project.scenario("plan").unwrap();
        project.add_dependency(a, sc, Dependency::new("b"));
        project.add_dependency(b, sc, Dependency::new("a"));
        xref(&mut project, sc).unwrap();

        for direction in [Direction::Successors, Direction::Predecessors] {
            match detect_cycles(&project, sc, direction) {
                Err(ScheduleError::Cycle(path)) => {
                    assert!(path.contains("a.start") && path.contains("b.end"), "{}", path);
                }
                other => panic!("expected loop, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_depending_on_parent_is_a_loop() {
        let mut project = Project::new("p", "Project");
        let group = project.add_task("group", "Group", None).unwrap();
        let child = project.add_task("child", "Child", Some(group)).unwrap();
        let sc = project.scenario("plan").unwrap();
        project.add_dependency(child, sc, Dependency::new("group"));
        xref(&mut project, sc).unwrap();

        assert!(detect_cycles(&project, sc, Direction::Successors).is_err());
    }

    #[test]
    fn test_chain_and_siblings_are_fine() {
        let mut project = Project::new("p", "Project");
        let group = project.add_task("group", "Group", None).unwrap();
        let a = project.add_task("a", "A", Some(group)).unwrap();
        project.add_task("b", "B", Some(group)).unwrap();
        project.add_task("c", "C", None).unwrap();
        let sc = project.scenario("plan").unwrap();
        project.add_dependency(a, sc, Dependency::new("b"));
        project.add_precedes(group, sc, Dependency::new("c"));
        xref(&mut project, sc).unwrap();

        assert!(detect_cycles(&project, sc, Direction::Successors).is_ok());
        assert!(detect_cycles(&project, sc, Direction::Predecessors).is_ok());
    }

    #[test]
    fn test_one_sided_link_is_found_in_its_direction() {
        let mut project = Project::new("p", "Project");
        let a = project.add_task("a", "A", None).unwrap();
        let b = project.add_task("b", "B", None).unwrap();
        let sc = project.scenario("plan").unwrap();
        // Predecessor lists only, without the matching successor entries
        for (task, peer) in [(a, b), (b, a)] {
            project.tasks[task.index()].scenarios[sc.index()]
                .links
                .start_preds
                .push(Link {
                    task: peer,
                    on_end: true,
                    gap: 0,
                });
        }

        assert!(detect_cycles(&project, sc, Direction::Successors).is_ok());
        assert!(matches!(
            detect_cycles(&project, sc, Direction::Predecessors),
            Err(ScheduleError::Cycle(_))
        ));
    }
}
