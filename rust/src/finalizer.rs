//! Committing results and checking the finished schedule of a scenario.

use chrono::{Duration, NaiveDateTime};

use crate::attributes::{AttributeValue, Provenance};
use crate::error::ScheduleError;
use crate::models::{Link, ScenarioId, TaskId};
use crate::project::Project;
use crate::scheduler::ScheduleOutcome;
use crate::{log_changes, log_debug};

pub struct ScenarioFinalizer<'a> {
    project: &'a mut Project,
    scenario: ScenarioId,
    escalate_runaways: bool,
    verbosity: u8,
}

impl<'a> ScenarioFinalizer<'a> {
    pub fn new(
        project: &'a mut Project,
        scenario: ScenarioId,
        escalate_runaways: bool,
        verbosity: u8,
    ) -> Self {
        Self {
            project,
            scenario,
            escalate_runaways,
            verbosity,
        }
    }

    /// Commit computed values, then check every root subtree.
    pub fn finish(&mut self, outcome: &ScheduleOutcome) -> Result<(), ScheduleError> {
        self.commit()?;
        for root in self.project.root_tasks() {
            self.check_subtree(root, outcome)?;
        }
        Ok(())
    }

    /// Mark scheduled leaves and derive container spans, children first.
    fn commit(&mut self) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        for task in self.project.tasks_top_down().into_iter().rev() {
            let children = self.project.task_ref(task).children.clone();
            if children.is_empty() {
                if self.project.work(task, sc).scheduled {
                    self.project.task_set(
                        task,
                        sc,
                        "scheduled",
                        AttributeValue::Boolean(true),
                        Provenance::Computed,
                    )?;
                }
                continue;
            }

            let mut span: Option<(NaiveDateTime, NaiveDateTime)> = None;
            let mut complete = true;
            for child in children {
                match self.project.task_span(child, sc)? {
                    Some((s, e)) => {
                        span = Some(match span {
                            None => (s, e),
                            Some((a, b)) => (a.min(s), b.max(e)),
                        });
                    }
                    None => complete = false,
                }
            }
            let Some((start, end)) = span.filter(|_| complete) else {
                continue;
            };
            self.project.set_scheduled_date(task, sc, "start", start)?;
            self.project.set_scheduled_date(task, sc, "end", end)?;
            self.project.task_set(
                task,
                sc,
                "scheduled",
                AttributeValue::Boolean(true),
                Provenance::Computed,
            )?;
            log_debug!(
                self.verbosity,
                "  Container {} spans {} - {}",
                self.project.task_ref(task).id,
                start,
                end
            );
        }
        Ok(())
    }

    fn check_subtree(&mut self, task: TaskId, outcome: &ScheduleOutcome) -> Result<(), ScheduleError> {
        for child in self.project.task_ref(task).children.clone() {
            self.check_subtree(child, outcome)?;
        }
        self.check_task(task, outcome)
    }

    fn check_task(&mut self, task: TaskId, outcome: &ScheduleOutcome) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        let id = self.project.task_ref(task).id.clone();

        let Some((start, end)) = self.project.task_span(task, sc)? else {
            if !self.project.task_ref(task).is_leaf() {
                return Ok(());
            }
            return self.unscheduled_leaf(task, &id, outcome);
        };

        if let (Some(ps), Some(pe)) = (self.project.start(), self.project.end()) {
            if start < ps || end > pe {
                return Err(ScheduleError::post_check(
                    &id,
                    format!("span {} - {} leaves the project {} - {}", start, end, ps, pe),
                ));
            }
        }

        for (key, value, must_be_before) in [
            ("minstart", start, false),
            ("maxstart", start, true),
            ("minend", end, false),
            ("maxend", end, true),
        ] {
            let Some(bound) = self.project.task_date(task, sc, key)? else {
                continue;
            };
            if (must_be_before && value > bound) || (!must_be_before && value < bound) {
                return Err(ScheduleError::post_check(
                    &id,
                    format!("{} {} violates {} {}", &key[3..], value, key, bound),
                ));
            }
        }

        let links = self.project.links(task, sc).clone();
        for link in &links.start_preds {
            self.check_order(&id, link, start, true)?;
        }
        for link in &links.end_preds {
            self.check_order(&id, link, end, true)?;
        }
        for link in &links.start_succs {
            self.check_order(&id, link, start, false)?;
        }
        for link in &links.end_succs {
            self.check_order(&id, link, end, false)?;
        }

        for &child in &self.project.task_ref(task).children {
            if let Some((cs, ce)) = self.project.task_span(child, sc)? {
                if cs < start || ce > end {
                    return Err(ScheduleError::post_check(
                        &id,
                        format!(
                            "span {} - {} does not enclose child {}",
                            start,
                            end,
                            self.project.task_ref(child).id
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// A predecessor must end `gap` before `own`; a successor must begin
    /// `gap` after it. Unscheduled peers are reported on their own.
    fn check_order(
        &self,
        id: &str,
        link: &Link,
        own: NaiveDateTime,
        is_pred: bool,
    ) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        let Some((ps, pe)) = self.project.task_span(link.task, sc)? else {
            return Ok(());
        };
        let peer = if link.on_end { pe } else { ps };
        let gap = Duration::seconds(link.gap);
        let ok = if is_pred {
            own >= peer + gap
        } else {
            own + gap <= peer
        };
        if ok {
            return Ok(());
        }
        let peer_id = &self.project.task_ref(link.task).id;
        let side = if link.on_end { "end" } else { "start" };
        Err(ScheduleError::post_check(
            id,
            if is_pred {
                format!("{} is before the {} of {} ({})", own, side, peer_id, peer)
            } else {
                format!("{} is after the {} of {} ({})", own, side, peer_id, peer)
            },
        ))
    }

    fn unscheduled_leaf(
        &mut self,
        task: TaskId,
        id: &str,
        outcome: &ScheduleOutcome,
    ) -> Result<(), ScheduleError> {
        let sc = self.scenario;
        let scenario = self.project.scenario_ref(sc).id.clone();
        if self.project.is_runaway(task, sc) {
            if self.escalate_runaways {
                return Err(ScheduleError::post_check(id, "does not fit into the project time frame"));
            }
            return Ok(());
        }
        if outcome.cancelled || !outcome.runaways.is_empty() {
            log_changes!(self.verbosity, "  {} was not scheduled", id);
            self.project.messages.warning(
                "unscheduled",
                format!("Task {} has not been scheduled", id),
                Some(&scenario),
                Some(id),
            );
            return Ok(());
        }
        Err(ScheduleError::post_check(id, "has not been scheduled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dependency;
    use crate::resolver::DependencyResolver;
    use crate::scheduler::{CancellationToken, PriorityScheduler};
    use chrono::NaiveDate;

    const DAY: i64 = 86400;

    fn d(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn project() -> (Project, ScenarioId) {
        let mut project = Project::new("p", "Project");
        project.set_bounds(d(2024, 1, 1), d(2024, 2, 1)).set_granularity(DAY);
        let sc = project.scenario("plan").unwrap();
        (project, sc)
    }

    fn leaf(project: &mut Project, sc: ScenarioId, id: &str, parent: Option<TaskId>, days: i64) -> TaskId {
        let t = project.add_task(id, id, parent).unwrap();
        project
            .set_task_attr(t, sc, "duration", AttributeValue::Duration(days * DAY))
            .unwrap();
        t
    }

    fn schedule(project: &mut Project, sc: ScenarioId) -> ScheduleOutcome {
        let sb = project.scoreboard().unwrap();
        DependencyResolver::new(project, sc, 0).resolve(&sb).unwrap();
        PriorityScheduler::new(project, sc, 0)
            .run(&sb, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_container_span_is_derived() {
        let (mut project, sc) = project();
        let group = project.add_task("group", "Group", None).unwrap();
        let a = leaf(&mut project, sc, "a", Some(group), 2);
        let b = leaf(&mut project, sc, "b", Some(group), 1);
        project.add_dependency(b, sc, Dependency::new("a"));

        let outcome = schedule(&mut project, sc);
        ScenarioFinalizer::new(&mut project, sc, false, 0)
            .finish(&outcome)
            .unwrap();

        assert_eq!(project.task_span(a, sc).unwrap(), Some((d(2024, 1, 1), d(2024, 1, 3))));
        assert_eq!(project.task_span(b, sc).unwrap(), Some((d(2024, 1, 3), d(2024, 1, 4))));
        assert_eq!(
            project.task_span(group, sc).unwrap(),
            Some((d(2024, 1, 1), d(2024, 1, 4)))
        );
        assert_eq!(
            project.task_attr(group, sc, "end").unwrap().provenance,
            Provenance::Computed
        );
    }

    #[test]
    fn test_runaway_escalation_is_configurable() {
        for escalate in [false, true] {
            let (mut project, sc) = project();
            let late = leaf(&mut project, sc, "late", None, 1);
            project
                .set_task_attr(late, sc, "minstart", AttributeValue::Date(Some(d(2024, 2, 2))))
                .unwrap();

            let outcome = schedule(&mut project, sc);
            let result = ScenarioFinalizer::new(&mut project, sc, escalate, 0).finish(&outcome);
            assert_eq!(result.is_err(), escalate);
        }
    }

    #[test]
    fn test_unscheduled_after_cancel_is_a_warning() {
        let (mut project, sc) = project();
        leaf(&mut project, sc, "a", None, 1);
        let sb = project.scoreboard().unwrap();
        DependencyResolver::new(&mut project, sc, 0).resolve(&sb).unwrap();
        let outcome = ScheduleOutcome {
            cancelled: true,
            ..ScheduleOutcome::default()
        };

        ScenarioFinalizer::new(&mut project, sc, false, 0)
            .finish(&outcome)
            .unwrap();
        assert_eq!(project.messages().messages()[0].id, "unscheduled");

        let not_cancelled = ScheduleOutcome::default();
        assert!(matches!(
            ScenarioFinalizer::new(&mut project, sc, false, 0).finish(&not_cancelled),
            Err(ScheduleError::PostCheck { .. })
        ));
    }

    #[test]
    fn test_violated_bound_fails() {
        let (mut project, sc) = project();
        let t = leaf(&mut project, sc, "t", None, 3);
        project
            .set_task_attr(t, sc, "maxend", AttributeValue::Date(Some(d(2024, 1, 2))))
            .unwrap();

        let outcome = schedule(&mut project, sc);
        match ScenarioFinalizer::new(&mut project, sc, false, 0).finish(&outcome) {
            Err(ScheduleError::PostCheck { task, reason }) => {
                assert_eq!(task, "t");
                assert!(reason.contains("maxend"), "{}", reason);
            }
            other => panic!("expected post check failure, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_ordering_is_detected() {
        let (mut project, sc) = project();
        let a = leaf(&mut project, sc, "a", None, 2);
        let b = leaf(&mut project, sc, "b", None, 1);
        let outcome = schedule(&mut project, sc);
        // b was placed next to a; an edge added afterwards must be caught
        project.tasks[b.index()].scenarios[sc.index()]
            .links
            .start_preds
            .push(Link {
                task: a,
                on_end: true,
                gap: 0,
            });

        assert!(matches!(
            ScenarioFinalizer::new(&mut project, sc, false, 0).finish(&outcome),
            Err(ScheduleError::PostCheck { .. })
        ));
    }
}
