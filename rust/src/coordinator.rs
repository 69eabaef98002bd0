//! Runs the scheduling pipeline for every enabled scenario.

use crate::attributes::{AttributeValue, Provenance};
use crate::config::SchedulingConfig;
use crate::error::ScheduleError;
use crate::finalizer::ScenarioFinalizer;
use crate::models::{ScenarioId, TaskId};
use crate::project::Project;
use crate::resolver::xref::{inherit_from_parent, propagate_shared_values};
use crate::resolver::DependencyResolver;
use crate::scheduler::{PriorityScheduler, ScheduleOutcome};
use crate::scoreboard::Scoreboard;
use crate::{log_changes, log_checks};

pub use crate::scheduler::CancellationToken;

/// Result of one scenario in a run.
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioOutcome {
    Scheduled {
        placements: usize,
        runaways: Vec<String>,
        cancelled: bool,
    },
    Failed(ScheduleError),
    /// Not attempted: an earlier scenario aborted the run or it was cancelled.
    Skipped,
    Disabled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioResult {
    pub scenario: String,
    pub outcome: ScenarioOutcome,
}

/// Per-scenario results of a scheduling run, in scenario order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub scenarios: Vec<ScenarioResult>,
    /// Failure of the shared setup; no scenario ran.
    pub setup_error: Option<ScheduleError>,
}

impl RunReport {
    /// True when setup worked and no scenario failed.
    pub fn is_success(&self) -> bool {
        self.setup_error.is_none() && self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ScheduleError)> {
        self.scenarios.iter().filter_map(|r| match &r.outcome {
            ScenarioOutcome::Failed(e) => Some((r.scenario.as_str(), e)),
            _ => None,
        })
    }

    pub fn outcome(&self, scenario: &str) -> Option<&ScenarioOutcome> {
        self.scenarios
            .iter()
            .find(|r| r.scenario == scenario)
            .map(|r| &r.outcome)
    }
}

pub struct ScenarioCoordinator<'a> {
    project: &'a mut Project,
    config: &'a SchedulingConfig,
    cancel: &'a CancellationToken,
}

impl<'a> ScenarioCoordinator<'a> {
    pub fn new(
        project: &'a mut Project,
        config: &'a SchedulingConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            project,
            config,
            cancel,
        }
    }

    pub fn run(mut self) -> RunReport {
        let verbosity = self.config.verbosity;
        let mut report = RunReport::default();

        let sb = match self.shared_setup() {
            Ok(sb) => sb,
            Err(e) => {
                self.project.messages.error(e.message_id(), e.to_string(), None, None);
                report.setup_error = Some(e);
                return report;
            }
        };

        let mut scenarios: Vec<ScenarioId> = self.project.scenario_ids().collect();
        scenarios.sort_by_key(|&sc| self.project.scenario_ref(sc).seq);

        let mut stopped = false;
        for sc in scenarios {
            let id = self.project.scenario_ref(sc).id.clone();
            let outcome = match self.project.scenario_bool(sc, "enabled") {
                Ok(false) => ScenarioOutcome::Disabled,
                _ if stopped || self.cancel.is_cancelled() => ScenarioOutcome::Skipped,
                Ok(true) => {
                    log_changes!(verbosity, "Scheduling scenario {}", id);
                    match self.schedule_scenario(sc, &sb) {
                        Ok(outcome) => {
                            stopped |= outcome.cancelled;
                            ScenarioOutcome::Scheduled {
                                placements: outcome.placements.len(),
                                runaways: outcome
                                    .runaways
                                    .iter()
                                    .map(|&t| self.project.task_ref(t).id.clone())
                                    .collect(),
                                cancelled: outcome.cancelled,
                            }
                        }
                        Err(e) => self.fail(&id, e, &mut stopped),
                    }
                }
                Err(e) => self.fail(&id, e, &mut stopped),
            };
            report.scenarios.push(ScenarioResult {
                scenario: id,
                outcome,
            });
        }
        report
    }

    fn fail(&mut self, id: &str, e: ScheduleError, stopped: &mut bool) -> ScenarioOutcome {
        log_changes!(self.config.verbosity, "Scenario {} failed: {}", id, e);
        self.project
            .messages
            .error(e.message_id(), e.to_string(), Some(id), None);
        if self.config.abort_on_failure {
            *stopped = true;
        }
        ScenarioOutcome::Failed(e)
    }

    fn schedule_scenario(
        &mut self,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let verbosity = self.config.verbosity;
        DependencyResolver::new(self.project, sc, verbosity).resolve(sb)?;
        let outcome = PriorityScheduler::new(self.project, sc, verbosity).run(sb, self.cancel)?;
        ScenarioFinalizer::new(self.project, sc, self.config.escalate_runaways, verbosity)
            .finish(&outcome)?;
        Ok(outcome)
    }

    /// Scenario independent work done once per run.
    fn shared_setup(&mut self) -> Result<Scoreboard, ScheduleError> {
        let sb = self.project.scoreboard()?;
        self.reindex()?;
        self.inherit_scenarios()?;
        propagate_shared_values(self.project)?;
        log_checks!(
            self.config.verbosity,
            "Shared setup done: {} slots of {}s",
            sb.size(),
            sb.granularity()
        );
        Ok(sb)
    }

    /// Assign `index` and outline numbers (`wbs`) in tree order.
    fn reindex(&mut self) -> Result<(), ScheduleError> {
        let any = ScenarioId::from_index(0);
        let roots = self.project.root_tasks();
        let mut stack: Vec<(TaskId, String)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &t)| (t, (i + 1).to_string()))
            .collect();
        let mut index = 0;
        while let Some((task, wbs)) = stack.pop() {
            index += 1;
            let children = self.project.task_ref(task).children.clone();
            for (i, &child) in children.iter().enumerate().rev() {
                stack.push((child, format!("{}.{}", wbs, i + 1)));
            }
            self.project
                .task_set(task, any, "index", AttributeValue::Integer(index), Provenance::Computed)?;
            self.project
                .task_set(task, any, "wbs", AttributeValue::Text(wbs), Provenance::Computed)?;
        }

        let resources: Vec<_> = self.project.resource_ids().collect();
        for (i, resource) in resources.into_iter().enumerate() {
            self.project.resource_set(
                resource,
                any,
                "index",
                AttributeValue::Integer(i as i64 + 1),
                Provenance::Computed,
            )?;
        }
        Ok(())
    }

    /// Scenario attributes flow from parent to child scenarios. Task and
    /// resource values follow their parent scenario when each scenario is
    /// prepared.
    fn inherit_scenarios(&mut self) -> Result<(), ScheduleError> {
        let mut order: Vec<ScenarioId> = self.project.scenario_ids().collect();
        order.sort_by_key(|&sc| self.project.scenario_ref(sc).seq);

        for sc in order {
            let schema = &self.project.scenario_schema;
            let attrs = &mut self.project.scenarios[sc.index()].attributes;
            attrs.reset_inherited_shared(schema);
            let Some(parent) = self.project.scenarios[sc.index()].parent else {
                continue;
            };
            let from = self.project.scenarios[parent.index()].attributes.clone();
            inherit_from_parent(
                &self.project.scenario_schema,
                &from,
                &mut self.project.scenarios[sc.index()].attributes,
                0,
                &[],
                false,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dependency;
    use chrono::{NaiveDate, NaiveDateTime};

    const DAY: i64 = 86400;

    fn d(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn project() -> Project {
        let mut project = Project::new("p", "Project");
        project.set_bounds(d(2024, 1, 1), d(2024, 2, 1)).set_granularity(DAY);
        project
    }

    fn leaf(project: &mut Project, id: &str, days: i64) -> TaskId {
        let sc = project.scenario("plan").unwrap();
        let t = project.add_task(id, id, None).unwrap();
        project
            .set_task_attr(t, sc, "duration", AttributeValue::Duration(days * DAY))
            .unwrap();
        t
    }

    #[test]
    fn test_cycle_fails_the_run() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let a = leaf(&mut project, "a", 1);
        let b = leaf(&mut project, "b", 1);
        project.add_dependency(a, sc, Dependency::new("b"));
        project.add_dependency(b, sc, Dependency::new("a"));

        let report = project.schedule(&SchedulingConfig::default());
        assert!(!report.is_success());
        assert!(matches!(
            report.outcome("plan"),
            Some(ScenarioOutcome::Failed(ScheduleError::Cycle(_)))
        ));
        for t in [a, b] {
            assert_eq!(project.task_span(t, sc).unwrap(), None);
            assert_ne!(
                project.task_attr(t, sc, "start").unwrap().provenance,
                Provenance::Computed
            );
        }
        assert_eq!(project.messages().messages()[0].id, "loop_detected");
    }

    #[test]
    fn test_dependency_chain_and_bounds() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let a = leaf(&mut project, "a", 1);
        let b = leaf(&mut project, "b", 2);
        project.add_dependency(b, sc, Dependency::new("a"));

        let report = project.schedule(&SchedulingConfig::default());
        assert!(report.is_success(), "{:?}", report);
        assert_eq!(project.task_span(a, sc).unwrap(), Some((d(2024, 1, 1), d(2024, 1, 2))));
        let (b_start, b_end) = project.task_span(b, sc).unwrap().unwrap();
        assert!(b_start >= d(2024, 1, 2));
        assert!(b_end <= d(2024, 2, 1));
    }

    fn scenario_project() -> (Project, ScenarioId, ScenarioId, ScenarioId) {
        let mut project = project();
        let plan = project.scenario("plan").unwrap();
        let broken = project.add_scenario("broken", "Broken", Some("plan")).unwrap();
        let later = project.add_scenario("later", "Later", Some("plan")).unwrap();
        let a = leaf(&mut project, "a", 1);
        leaf(&mut project, "b", 1);
        project.add_dependency(a, broken, Dependency::new("nowhere"));
        (project, plan, broken, later)
    }

    #[test]
    fn test_failures_are_isolated_by_default() {
        let (mut project, plan, broken, later) = scenario_project();
        let a = project.task("a").unwrap();

        let report = project.schedule(&SchedulingConfig::default());
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert!(matches!(
            report.outcome("broken"),
            Some(ScenarioOutcome::Failed(ScheduleError::UnknownReference { .. }))
        ));
        assert!(project.task_span(a, plan).unwrap().is_some());
        assert!(project.task_span(a, broken).unwrap().is_none());
        // Durations given in plan reach the child scenario
        assert_eq!(project.task_span(a, later).unwrap(), project.task_span(a, plan).unwrap());
    }

    #[test]
    fn test_abort_on_failure_skips_the_rest() {
        let (mut project, _, _, _) = scenario_project();
        let report = project.schedule(&SchedulingConfig::default().aborting());
        assert!(matches!(
            report.outcome("plan"),
            Some(ScenarioOutcome::Scheduled { .. })
        ));
        assert!(matches!(report.outcome("broken"), Some(ScenarioOutcome::Failed(_))));
        assert_eq!(report.outcome("later"), Some(&ScenarioOutcome::Skipped));
    }

    #[test]
    fn test_scenario_override() {
        let mut project = project();
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();
        let a = leaf(&mut project, "a", 1);
        project
            .set_task_attr(a, delayed, "duration", AttributeValue::Duration(3 * DAY))
            .unwrap();

        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        let plan = project.scenario("plan").unwrap();
        assert_eq!(project.task_span(a, plan).unwrap().unwrap().1, d(2024, 1, 2));
        assert_eq!(project.task_span(a, delayed).unwrap().unwrap().1, d(2024, 1, 4));
    }

    #[test]
    fn test_disabled_scenario_is_not_scheduled() {
        let mut project = project();
        let off = project.add_scenario("off", "Off", Some("plan")).unwrap();
        project
            .set_scenario_attr(off, "enabled", AttributeValue::Boolean(false))
            .unwrap();
        let a = leaf(&mut project, "a", 1);

        let report = project.schedule(&SchedulingConfig::default());
        assert!(report.is_success());
        assert_eq!(report.outcome("off"), Some(&ScenarioOutcome::Disabled));
        assert!(project.task_span(a, off).unwrap().is_none());
    }

    #[test]
    fn test_runaway_run_still_succeeds() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let late = leaf(&mut project, "late", 1);
        project
            .set_task_attr(late, sc, "minstart", AttributeValue::Date(Some(d(2024, 2, 2))))
            .unwrap();

        let report = project.schedule(&SchedulingConfig::default());
        assert!(report.is_success());
        match report.outcome("plan") {
            Some(ScenarioOutcome::Scheduled { runaways, .. }) => {
                assert_eq!(runaways, &vec!["late".to_string()])
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(project.is_runaway(late, sc));

        let escalated = project.schedule(&SchedulingConfig::default().escalating_runaways());
        assert!(!escalated.is_success());
    }

    #[test]
    fn test_identical_input_gives_identical_placements() {
        let build = || {
            let mut project = project();
            let sc = project.scenario("plan").unwrap();
            for i in 0..5 {
                let t = leaf(&mut project, &format!("t{}", i), 1 + i % 2);
                if i > 1 {
                    project.add_dependency(t, sc, Dependency::new(format!("t{}", i - 2)));
                }
            }
            project.schedule(&SchedulingConfig::default());
            project
                .task_ids()
                .map(|t| project.task_span(t, sc).unwrap())
                .collect::<Vec<_>>()
        };
        let first = build();
        assert!(first.iter().all(Option::is_some));
        assert_eq!(first, build());
    }

    #[test]
    fn test_rescheduling_gives_the_same_result() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let a = leaf(&mut project, "a", 2);
        let b = leaf(&mut project, "b", 1);
        project.add_dependency(b, sc, Dependency::new("a"));

        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        let first = (project.task_span(a, sc).unwrap(), project.task_span(b, sc).unwrap());
        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(first, (project.task_span(a, sc).unwrap(), project.task_span(b, sc).unwrap()));
    }

    #[test]
    fn test_unaligned_start_survives_rescheduling() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let a = leaf(&mut project, "a", 1);
        let noon = d(2024, 1, 3) + chrono::Duration::hours(12);
        project
            .set_task_attr(a, sc, "start", AttributeValue::Date(Some(noon)))
            .unwrap();

        for _ in 0..2 {
            assert!(project.schedule(&SchedulingConfig::default()).is_success());
            assert_eq!(
                project.task_span(a, sc).unwrap(),
                Some((d(2024, 1, 4), d(2024, 1, 5)))
            );
            let start = project.task_attr(a, sc, "start").unwrap();
            assert_eq!(start.provenance, Provenance::Computed);
        }
    }

    #[test]
    fn test_given_bounds_survive_rescheduling() {
        let mut project = project();
        let sc = project.scenario("plan").unwrap();
        let a = project.add_task("a", "A", None).unwrap();
        let late = d(2024, 1, 10) + chrono::Duration::hours(12);
        project
            .set_task_attr(a, sc, "start", AttributeValue::Date(Some(d(2024, 1, 1))))
            .unwrap();
        project
            .set_task_attr(a, sc, "end", AttributeValue::Date(Some(late)))
            .unwrap();

        for _ in 0..2 {
            let report = project.schedule(&SchedulingConfig::default());
            assert!(report.is_success(), "{:?}", report);
            assert_eq!(
                project.task_span(a, sc).unwrap(),
                Some((d(2024, 1, 1), d(2024, 1, 11)))
            );
        }
    }

    #[test]
    fn test_parent_scenario_edits_reach_children() {
        let mut project = project();
        let plan = project.scenario("plan").unwrap();
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();
        let a = leaf(&mut project, "a", 1);

        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(
            project.task_span(a, delayed).unwrap(),
            Some((d(2024, 1, 1), d(2024, 1, 2)))
        );

        project
            .set_task_attr(a, plan, "duration", AttributeValue::Duration(5 * DAY))
            .unwrap();
        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(
            project.task_span(a, delayed).unwrap(),
            Some((d(2024, 1, 1), d(2024, 1, 6)))
        );

        // An own value in the child wins over later parent edits
        project
            .set_task_attr(a, delayed, "duration", AttributeValue::Duration(2 * DAY))
            .unwrap();
        project
            .set_task_attr(a, plan, "duration", AttributeValue::Duration(4 * DAY))
            .unwrap();
        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(project.task_span(a, plan).unwrap().unwrap().1, d(2024, 1, 5));
        assert_eq!(project.task_span(a, delayed).unwrap().unwrap().1, d(2024, 1, 3));
    }

    #[test]
    fn test_parent_scenario_dependencies_follow_edits() {
        let mut project = project();
        let plan = project.scenario("plan").unwrap();
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();
        let a = leaf(&mut project, "a", 2);
        let b = leaf(&mut project, "b", 1);

        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(project.task_span(b, delayed).unwrap().unwrap().0, d(2024, 1, 1));

        project.add_dependency(b, plan, Dependency::new("a"));
        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        assert_eq!(project.task_span(a, delayed).unwrap().unwrap().1, d(2024, 1, 3));
        assert_eq!(project.task_span(b, delayed).unwrap().unwrap().0, d(2024, 1, 3));
    }

    #[test]
    fn test_cancelled_run_is_not_an_error() {
        let mut project = project();
        let a = leaf(&mut project, "a", 1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = project.schedule_with_cancel(&SchedulingConfig::default(), &cancel);
        assert!(report.is_success());
        assert_eq!(report.outcome("plan"), Some(&ScenarioOutcome::Skipped));
        let sc = project.scenario("plan").unwrap();
        assert!(project.task_span(a, sc).unwrap().is_none());
    }

    #[test]
    fn test_reindex_assigns_outline_numbers() {
        let mut project = project();
        let group = project.add_task("group", "Group", None).unwrap();
        let first = project.add_task("first", "First", Some(group)).unwrap();
        let second = project.add_task("second", "Second", Some(group)).unwrap();
        let solo = project.add_task("solo", "Solo", None).unwrap();
        let sc = project.scenario("plan").unwrap();
        for t in [first, second, solo] {
            project
                .set_task_attr(t, sc, "duration", AttributeValue::Duration(DAY))
                .unwrap();
        }

        assert!(project.schedule(&SchedulingConfig::default()).is_success());
        let wbs = |t| project.task_attr(t, sc, "wbs").unwrap().value.clone();
        assert_eq!(wbs(group), AttributeValue::Text("1".into()));
        assert_eq!(wbs(second), AttributeValue::Text("1.2".into()));
        assert_eq!(wbs(solo), AttributeValue::Text("2".into()));
        assert_eq!(project.task_int(solo, sc, "index").unwrap(), 4);
    }

    #[test]
    fn test_missing_bounds_is_a_setup_error() {
        let mut project = Project::new("p", "Project");
        leaf(&mut project, "a", 1);
        let report = project.schedule(&SchedulingConfig::default());
        assert!(matches!(report.setup_error, Some(ScheduleError::Configuration(_))));
        assert!(report.scenarios.is_empty());
    }
}
