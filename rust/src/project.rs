//! The project: global settings plus the scenario, task and resource arenas.

use chrono::{Duration, NaiveDateTime};

use crate::attributes::{typed, Attribute, AttributeSchema, AttributeValue, PropertyAttributes, Provenance};
use crate::calendar::{Calendar, Interval, WorkingHours};
use crate::config::SchedulingConfig;
use crate::coordinator::{CancellationToken, RunReport, ScenarioCoordinator};
use crate::error::ScheduleError;
use crate::interner::IdInterner;
use crate::messages::MessageHandler;
use crate::models::{
    resource_schema, scenario_schema, task_schema, Allocation, Dependency, Resource, ResourceId,
    ResourceScenario, Scenario, ScenarioId, Task, TaskId, TaskScenario,
};
use crate::report::Report;
use crate::scoreboard::Scoreboard;

/// Default schedule granularity: one hour.
pub const DEFAULT_GRANULARITY: i64 = 3600;

/// Average number of weeks in a year.
const WEEKS_PER_YEAR: f64 = 52.1429;

pub struct Project {
    pub id: String,
    pub name: String,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    granularity: i64,
    daily_working_hours: f64,
    yearly_working_days: f64,
    working_hours: WorkingHours,
    vacations: Vec<Interval>,

    pub(crate) scenario_schema: AttributeSchema,
    pub(crate) task_schema: AttributeSchema,
    pub(crate) resource_schema: AttributeSchema,

    pub(crate) scenarios: Vec<Scenario>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) resources: Vec<Resource>,

    scenario_ids: IdInterner,
    task_ids: IdInterner,
    resource_ids: IdInterner,

    reports: Vec<Box<dyn Report>>,
    pub(crate) messages: MessageHandler,
}

impl Project {
    /// Create a project with a single default scenario `plan`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut project = Self {
            id: id.into(),
            name: name.into(),
            start: None,
            end: None,
            granularity: DEFAULT_GRANULARITY,
            daily_working_hours: 8.0,
            yearly_working_days: 260.714,
            working_hours: WorkingHours::default(),
            vacations: Vec::new(),
            scenario_schema: scenario_schema(),
            task_schema: task_schema(),
            resource_schema: resource_schema(),
            scenarios: Vec::new(),
            tasks: Vec::new(),
            resources: Vec::new(),
            scenario_ids: IdInterner::default(),
            task_ids: IdInterner::default(),
            resource_ids: IdInterner::default(),
            reports: Vec::new(),
            messages: MessageHandler::default(),
        };
        if let Some(idx) = project.scenario_ids.insert("plan") {
            project.push_scenario(idx, "plan", "Plan Scenario", None);
        }
        project
    }

    // ------------------------------------------------------------------
    // Global settings
    // ------------------------------------------------------------------

    pub fn set_bounds(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> &mut Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn set_granularity(&mut self, seconds: i64) -> &mut Self {
        self.granularity = seconds;
        self
    }

    pub fn set_daily_working_hours(&mut self, hours: f64) -> &mut Self {
        self.daily_working_hours = hours;
        self
    }

    pub fn set_yearly_working_days(&mut self, days: f64) -> &mut Self {
        self.yearly_working_days = days;
        self
    }

    pub fn set_working_hours(&mut self, hours: WorkingHours) -> &mut Self {
        self.working_hours = hours;
        self
    }

    pub fn add_vacation(&mut self, vacation: Interval) -> &mut Self {
        self.vacations.push(vacation);
        self
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn granularity(&self) -> i64 {
        self.granularity
    }

    pub fn working_hours(&self) -> &WorkingHours {
        &self.working_hours
    }

    /// Seconds of work in one working day.
    pub fn daily_working_seconds(&self) -> f64 {
        self.daily_working_hours * 3600.0
    }

    pub fn yearly_working_days(&self) -> f64 {
        self.yearly_working_days
    }

    pub fn monthly_working_days(&self) -> f64 {
        self.yearly_working_days / 12.0
    }

    pub fn weekly_working_days(&self) -> f64 {
        self.yearly_working_days / WEEKS_PER_YEAR
    }

    /// Express working seconds in working days.
    pub fn convert_to_daily_load(&self, seconds: f64) -> f64 {
        seconds / self.daily_working_seconds()
    }

    /// A fresh scoreboard for the current project bounds.
    pub fn scoreboard(&self) -> Result<Scoreboard, ScheduleError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Scoreboard::new(start, end, self.granularity),
            _ => Err(ScheduleError::Configuration(
                "project start and end must be set before scheduling".to_string(),
            )),
        }
    }

    /// Project working seconds in `iv`; global vacations count as off time.
    pub fn working_seconds(&self, iv: &Interval) -> i64 {
        if self.vacations.iter().any(|v| v.overlaps(iv)) {
            return 0;
        }
        self.working_hours.working_seconds(iv)
    }

    pub fn is_working_time(&self, iv: &Interval) -> bool {
        self.working_seconds(iv) > 0
    }

    /// Working seconds a resource offers in `iv`.
    pub fn resource_working_seconds(&self, resource: ResourceId, iv: &Interval) -> i64 {
        if self.vacations.iter().any(|v| v.overlaps(iv)) {
            return 0;
        }
        self.resources[resource.index()]
            .calendar
            .working_seconds(iv, &self.working_hours)
    }

    // ------------------------------------------------------------------
    // Property construction
    // ------------------------------------------------------------------

    pub fn add_scenario(
        &mut self,
        id: &str,
        name: &str,
        parent: Option<&str>,
    ) -> Result<ScenarioId, ScheduleError> {
        let parent = match parent {
            Some(p) => Some(self.scenario(p).ok_or_else(|| {
                ScheduleError::Configuration(format!("Unknown parent scenario {}", p))
            })?),
            None => None,
        };
        let idx = self
            .scenario_ids
            .insert(id)
            .ok_or_else(|| ScheduleError::Configuration(format!("Duplicate scenario {}", id)))?;
        Ok(self.push_scenario(idx, id, name, parent))
    }

    fn push_scenario(
        &mut self,
        idx: usize,
        id: &str,
        name: &str,
        parent: Option<ScenarioId>,
    ) -> ScenarioId {
        let sc = ScenarioId::from_index(idx);
        self.scenarios.push(Scenario {
            id: id.to_string(),
            name: name.to_string(),
            seq: idx + 1,
            parent,
            children: Vec::new(),
            attributes: PropertyAttributes::new(&self.scenario_schema, 0),
        });
        if let Some(p) = parent {
            self.scenarios[p.index()].children.push(sc);
        }
        for task in &mut self.tasks {
            task.attributes.add_scenario(&self.task_schema);
            task.scenarios.push(TaskScenario::default());
        }
        for resource in &mut self.resources {
            resource.attributes.add_scenario(&self.resource_schema);
            resource.scenarios.push(ResourceScenario::default());
        }
        sc
    }

    pub fn add_task(
        &mut self,
        id: &str,
        name: &str,
        parent: Option<TaskId>,
    ) -> Result<TaskId, ScheduleError> {
        if let Some(p) = parent {
            if p.index() >= self.tasks.len() {
                return Err(ScheduleError::Configuration(format!(
                    "Unknown parent task for {}",
                    id
                )));
            }
        }
        let idx = self
            .task_ids
            .insert(id)
            .ok_or_else(|| ScheduleError::Configuration(format!("Duplicate task {}", id)))?;
        let task = TaskId::from_index(idx);
        let count = self.scenarios.len();
        self.tasks.push(Task {
            id: id.to_string(),
            name: name.to_string(),
            seq: idx + 1,
            parent,
            children: Vec::new(),
            attributes: PropertyAttributes::new(&self.task_schema, count),
            scenarios: vec![TaskScenario::default(); count],
        });
        if let Some(p) = parent {
            self.tasks[p.index()].children.push(task);
        }
        Ok(task)
    }

    pub fn add_resource(
        &mut self,
        id: &str,
        name: &str,
        parent: Option<ResourceId>,
    ) -> Result<ResourceId, ScheduleError> {
        if let Some(p) = parent {
            if p.index() >= self.resources.len() {
                return Err(ScheduleError::Configuration(format!(
                    "Unknown parent resource for {}",
                    id
                )));
            }
        }
        let idx = self
            .resource_ids
            .insert(id)
            .ok_or_else(|| ScheduleError::Configuration(format!("Duplicate resource {}", id)))?;
        let resource = ResourceId::from_index(idx);
        let count = self.scenarios.len();
        self.resources.push(Resource {
            id: id.to_string(),
            name: name.to_string(),
            seq: idx + 1,
            parent,
            children: Vec::new(),
            calendar: Calendar::default(),
            attributes: PropertyAttributes::new(&self.resource_schema, count),
            scenarios: vec![ResourceScenario::default(); count],
        });
        if let Some(p) = parent {
            self.resources[p.index()].children.push(resource);
        }
        Ok(resource)
    }

    pub fn add_report(&mut self, report: Box<dyn Report>) {
        self.reports.push(report);
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn scenario(&self, id: &str) -> Option<ScenarioId> {
        self.scenario_ids.get(id).map(ScenarioId::from_index)
    }

    /// Scenario by sequence index (its `seq` minus one).
    pub fn scenario_at(&self, index: usize) -> Option<ScenarioId> {
        self.scenarios
            .iter()
            .position(|s| s.seq == index + 1)
            .map(ScenarioId::from_index)
    }

    /// Sequence index of the scenario with this id.
    pub fn scenario_idx(&self, id: &str) -> Option<usize> {
        self.scenario(id).map(|sc| self.scenarios[sc.index()].seq - 1)
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Parent, grandparent and so on of a scenario.
    pub fn scenario_ancestors(&self, sc: ScenarioId) -> Vec<ScenarioId> {
        let mut chain = Vec::new();
        let mut cursor = self.scenarios[sc.index()].parent;
        while let Some(p) = cursor {
            chain.push(p);
            cursor = self.scenarios[p.index()].parent;
        }
        chain
    }

    pub fn task(&self, id: &str) -> Option<TaskId> {
        self.task_ids.get(id).map(TaskId::from_index)
    }

    pub fn resource(&self, id: &str) -> Option<ResourceId> {
        self.resource_ids.get(id).map(ResourceId::from_index)
    }

    pub fn scenario_ref(&self, sc: ScenarioId) -> &Scenario {
        &self.scenarios[sc.index()]
    }

    pub fn task_ref(&self, task: TaskId) -> &Task {
        &self.tasks[task.index()]
    }

    pub fn resource_ref(&self, resource: ResourceId) -> &Resource {
        &self.resources[resource.index()]
    }

    pub fn scenario_ids(&self) -> impl Iterator<Item = ScenarioId> {
        (0..self.scenarios.len()).map(ScenarioId::from_index)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> {
        (0..self.tasks.len()).map(TaskId::from_index)
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> {
        (0..self.resources.len()).map(ResourceId::from_index)
    }

    pub fn root_tasks(&self) -> Vec<TaskId> {
        self.task_ids()
            .filter(|t| self.tasks[t.index()].parent.is_none())
            .collect()
    }

    pub fn leaf_tasks(&self) -> Vec<TaskId> {
        self.task_ids()
            .filter(|t| self.tasks[t.index()].is_leaf())
            .collect()
    }

    /// Tasks in depth-first pre-order, parents before children.
    pub fn tasks_top_down(&self) -> Vec<TaskId> {
        let mut order = Vec::with_capacity(self.tasks.len());
        let mut stack: Vec<TaskId> = self.root_tasks().into_iter().rev().collect();
        while let Some(task) = stack.pop() {
            order.push(task);
            stack.extend(self.tasks[task.index()].children.iter().rev().copied());
        }
        order
    }

    pub fn messages(&self) -> &MessageHandler {
        &self.messages
    }

    // ------------------------------------------------------------------
    // User input
    // ------------------------------------------------------------------

    pub fn set_task_attr(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), ScheduleError> {
        self.task_set(task, sc, key, value, Provenance::Provided)
    }

    pub fn set_resource_attr(
        &mut self,
        resource: ResourceId,
        sc: ScenarioId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), ScheduleError> {
        self.resource_set(resource, sc, key, value, Provenance::Provided)
    }

    pub fn set_scenario_attr(
        &mut self,
        sc: ScenarioId,
        key: &str,
        value: AttributeValue,
    ) -> Result<(), ScheduleError> {
        self.scenarios[sc.index()]
            .attributes
            .set(&self.scenario_schema, key, 0, value, Provenance::Provided)
    }

    /// Add a `depends` entry: the task waits for `dep.target`.
    pub fn add_dependency(&mut self, task: TaskId, sc: ScenarioId, dep: Dependency) {
        self.tasks[task.index()].scenarios[sc.index()]
            .depends
            .get_or_insert_with(Vec::new)
            .push(dep);
    }

    /// Add a `precedes` entry: `dep.target` waits for the task.
    pub fn add_precedes(&mut self, task: TaskId, sc: ScenarioId, dep: Dependency) {
        self.tasks[task.index()].scenarios[sc.index()]
            .precedes
            .get_or_insert_with(Vec::new)
            .push(dep);
    }

    pub fn add_allocation(&mut self, task: TaskId, sc: ScenarioId, allocation: Allocation) {
        self.tasks[task.index()].scenarios[sc.index()]
            .allocate
            .get_or_insert_with(Vec::new)
            .push(allocation);
    }

    /// First list found walking from `sc` up the scenario tree.
    fn scenario_list<T>(
        &self,
        task: TaskId,
        sc: ScenarioId,
        pick: impl Fn(&TaskScenario) -> Option<&Vec<T>>,
    ) -> &[T] {
        let scenarios = &self.tasks[task.index()].scenarios;
        let mut cursor = Some(sc);
        while let Some(s) = cursor {
            if let Some(list) = pick(&scenarios[s.index()]) {
                return list;
            }
            cursor = self.scenarios[s.index()].parent;
        }
        &[]
    }

    /// `depends` entries of a task; child scenarios without their own use
    /// their parent's.
    pub fn depends(&self, task: TaskId, sc: ScenarioId) -> &[Dependency] {
        self.scenario_list(task, sc, |d| d.depends.as_ref())
    }

    pub fn precedes(&self, task: TaskId, sc: ScenarioId) -> &[Dependency] {
        self.scenario_list(task, sc, |d| d.precedes.as_ref())
    }

    pub fn allocations(&self, task: TaskId, sc: ScenarioId) -> &[Allocation] {
        self.scenario_list(task, sc, |d| d.allocate.as_ref())
    }

    pub fn resource_calendar_mut(&mut self, resource: ResourceId) -> &mut Calendar {
        &mut self.resources[resource.index()].calendar
    }

    // ------------------------------------------------------------------
    // Attribute access
    // ------------------------------------------------------------------

    pub fn task_attr(
        &self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<&Attribute, ScheduleError> {
        self.tasks[task.index()]
            .attributes
            .get(&self.task_schema, key, sc.index())
    }

    pub fn task_set(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
        value: AttributeValue,
        provenance: Provenance,
    ) -> Result<(), ScheduleError> {
        self.tasks[task.index()]
            .attributes
            .set(&self.task_schema, key, sc.index(), value, provenance)
    }

    pub fn task_bool(&self, task: TaskId, sc: ScenarioId, key: &str) -> Result<bool, ScheduleError> {
        typed::boolean(self.task_attr(task, sc, key)?, key)
    }

    pub fn task_int(&self, task: TaskId, sc: ScenarioId, key: &str) -> Result<i64, ScheduleError> {
        typed::integer(self.task_attr(task, sc, key)?, key)
    }

    pub fn task_float(&self, task: TaskId, sc: ScenarioId, key: &str) -> Result<f64, ScheduleError> {
        typed::float(self.task_attr(task, sc, key)?, key)
    }

    pub fn task_date(
        &self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        typed::date(self.task_attr(task, sc, key)?, key)
    }

    pub fn task_duration(
        &self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<i64, ScheduleError> {
        typed::duration(self.task_attr(task, sc, key)?, key)
    }

    pub fn resource_attr(
        &self,
        resource: ResourceId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<&Attribute, ScheduleError> {
        self.resources[resource.index()]
            .attributes
            .get(&self.resource_schema, key, sc.index())
    }

    pub fn resource_set(
        &mut self,
        resource: ResourceId,
        sc: ScenarioId,
        key: &str,
        value: AttributeValue,
        provenance: Provenance,
    ) -> Result<(), ScheduleError> {
        self.resources[resource.index()]
            .attributes
            .set(&self.resource_schema, key, sc.index(), value, provenance)
    }

    pub fn resource_duration(
        &self,
        resource: ResourceId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<i64, ScheduleError> {
        typed::duration(self.resource_attr(resource, sc, key)?, key)
    }

    pub fn resource_float(
        &self,
        resource: ResourceId,
        sc: ScenarioId,
        key: &str,
    ) -> Result<f64, ScheduleError> {
        typed::float(self.resource_attr(resource, sc, key)?, key)
    }

    pub fn scenario_bool(&self, sc: ScenarioId, key: &str) -> Result<bool, ScheduleError> {
        let attr = self.scenarios[sc.index()]
            .attributes
            .get(&self.scenario_schema, key, 0)?;
        typed::boolean(attr, key)
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Scheduled `(start, end)` of a task in a scenario, `None` while the
    /// task is not scheduled.
    pub fn task_span(
        &self,
        task: TaskId,
        sc: ScenarioId,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, ScheduleError> {
        if !self.task_bool(task, sc, "scheduled")? {
            return Ok(None);
        }
        let start = self.task_date(task, sc, "start")?;
        let end = self.task_date(task, sc, "end")?;
        Ok(start.zip(end))
    }

    pub fn is_runaway(&self, task: TaskId, sc: ScenarioId) -> bool {
        self.tasks[task.index()].scenarios[sc.index()].work.runaway
    }

    /// Resources and slot starts booked for a task in a scenario.
    pub fn bookings(&self, task: TaskId, sc: ScenarioId) -> Vec<(ResourceId, NaiveDateTime)> {
        let Some(start) = self.start else {
            return Vec::new();
        };
        self.tasks[task.index()].scenarios[sc.index()]
            .work
            .bookings
            .iter()
            .map(|&(idx, r)| (r, start + Duration::seconds(idx as i64 * self.granularity)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Schedule every enabled scenario.
    pub fn schedule(&mut self, config: &SchedulingConfig) -> RunReport {
        self.schedule_with_cancel(config, &CancellationToken::new())
    }

    pub fn schedule_with_cancel(
        &mut self,
        config: &SchedulingConfig,
        cancel: &CancellationToken,
    ) -> RunReport {
        ScenarioCoordinator::new(self, config, cancel).run()
    }

    /// Generate all registered reports. Failures are printed to stderr.
    pub fn generate_reports(&self) -> bool {
        for report in &self.reports {
            if let Err(e) = report.generate(self) {
                eprintln!("Reporting Error: {}", e);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_project_has_plan_scenario() {
        let project = Project::new("p", "Project");
        let plan = project.scenario("plan").unwrap();
        assert_eq!(project.scenario_ref(plan).seq, 1);
        assert!(project.scenario_bool(plan, "enabled").unwrap());
    }

    #[test]
    fn test_scenarios_added_later_reach_existing_tasks() {
        let mut project = Project::new("p", "Project");
        let t = project.add_task("t", "T", None).unwrap();
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();

        project
            .set_task_attr(t, delayed, "priority", AttributeValue::Integer(900))
            .unwrap();
        assert_eq!(project.task_int(t, delayed, "priority").unwrap(), 900);
        let plan = project.scenario("plan").unwrap();
        assert_eq!(project.task_int(t, plan, "priority").unwrap(), 500);
        assert_eq!(project.scenario_ref(plan).children, vec![delayed]);
    }

    #[test]
    fn test_duplicate_and_unknown_ids() {
        let mut project = Project::new("p", "Project");
        project.add_task("t", "T", None).unwrap();
        assert!(project.add_task("t", "Again", None).is_err());
        assert!(project.add_scenario("x", "X", Some("nope")).is_err());
        assert!(project.add_task("u", "U", Some(TaskId(42))).is_err());
    }

    #[test]
    fn test_tree_order() {
        let mut project = Project::new("p", "Project");
        let a = project.add_task("a", "A", None).unwrap();
        let b = project.add_task("b", "B", None).unwrap();
        let a1 = project.add_task("a1", "A1", Some(a)).unwrap();
        let a2 = project.add_task("a2", "A2", Some(a)).unwrap();

        assert_eq!(project.tasks_top_down(), vec![a, a1, a2, b]);
        assert_eq!(project.root_tasks(), vec![a, b]);
        assert_eq!(project.leaf_tasks(), vec![b, a1, a2]);
    }

    #[test]
    fn test_scenario_lookup_by_id_and_index() {
        let mut project = Project::new("p", "Project");
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();
        let worst = project.add_scenario("worst", "Worst", Some("delayed")).unwrap();

        assert_eq!(project.scenario_count(), 3);
        assert_eq!(project.scenario_at(1), Some(delayed));
        assert_eq!(project.scenario_at(3), None);
        assert_eq!(project.scenario_idx("worst"), Some(2));
        assert_eq!(project.scenario_idx("nope"), None);
        let plan = project.scenario("plan").unwrap();
        assert_eq!(project.scenario_ancestors(worst), vec![delayed, plan]);
    }

    #[test]
    fn test_working_day_conversions() {
        let mut project = Project::new("p", "Project");
        assert!((project.weekly_working_days() - 5.0).abs() < 0.001);
        assert!((project.monthly_working_days() - 21.726).abs() < 0.001);
        assert_eq!(project.convert_to_daily_load(16.0 * 3600.0), 2.0);

        project.set_yearly_working_days(240.0).set_daily_working_hours(6.0);
        assert_eq!(project.yearly_working_days(), 240.0);
        assert_eq!(project.monthly_working_days(), 20.0);
        assert_eq!(project.convert_to_daily_load(3.0 * 3600.0), 0.5);
    }

    #[test]
    fn test_lists_fall_back_to_parent_scenario() {
        let mut project = Project::new("p", "Project");
        let t = project.add_task("t", "T", None).unwrap();
        let plan = project.scenario("plan").unwrap();
        let delayed = project.add_scenario("delayed", "Delayed", Some("plan")).unwrap();
        project.add_dependency(t, plan, Dependency::new("a"));

        assert_eq!(project.depends(t, delayed), &[Dependency::new("a")]);
        project.add_dependency(t, delayed, Dependency::new("b"));
        assert_eq!(project.depends(t, delayed), &[Dependency::new("b")]);
        assert!(project.precedes(t, delayed).is_empty());
        assert!(project.allocations(t, plan).is_empty());
    }

    #[test]
    fn test_span_of_unknown_scenario_is_an_error() {
        let mut project = Project::new("p", "Project");
        let t = project.add_task("t", "T", None).unwrap();
        let plan = project.scenario("plan").unwrap();
        assert_eq!(project.task_span(t, plan).unwrap(), None);
        assert!(matches!(
            project.task_span(t, ScenarioId(7)),
            Err(ScheduleError::Configuration(_))
        ));
    }

    #[test]
    fn test_scoreboard_requires_bounds() {
        let mut project = Project::new("p", "Project");
        assert!(project.scoreboard().is_err());
        project.set_bounds(d(2024, 1, 1), d(2024, 2, 1)).set_granularity(86400);
        assert_eq!(project.scoreboard().unwrap().size(), 31);
    }

    #[test]
    fn test_global_vacation_is_not_working_time() {
        let mut project = Project::new("p", "Project");
        project.add_vacation(Interval::new(d(2024, 1, 2), d(2024, 1, 3)));
        assert!(!project.is_working_time(&Interval::from_slot(d(2024, 1, 2), 86400)));
        assert!(project.is_working_time(&Interval::from_slot(d(2024, 1, 3), 86400)));
    }
}
