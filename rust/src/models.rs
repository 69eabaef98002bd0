//! Core data types: scenarios, tasks, resources and their scheduling state.
//!
//! Properties live in flat arenas owned by [`crate::Project`] and refer to
//! each other by index only.

use chrono::NaiveDateTime;

use crate::attributes::{
    AttributeDefinition, AttributeKind, AttributeSchema, AttributeValue, PropertyAttributes,
};
use crate::calendar::Calendar;
use crate::resource_schedule::ResourceSchedule;

/// Index of a task in the project arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u32);

/// Index of a resource in the project arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

/// Index of a scenario in the project arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioId(pub(crate) u32);

macro_rules! arena_index {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(idx: usize) -> Self {
                Self(idx as u32)
            }
        }
    };
}

arena_index!(TaskId);
arena_index!(ResourceId);
arena_index!(ScenarioId);

/// A user-specified dependency on another task, by identifier.
///
/// `on_end` names the endpoint of the referenced task. When unset, `depends`
/// refers to the end of the other task and `precedes` to its start.
#[derive(Clone, Debug, PartialEq)]
pub struct Dependency {
    pub target: String,
    pub on_end: Option<bool>,
    /// Minimum calendar gap in seconds.
    pub gap: i64,
}

impl Dependency {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            on_end: None,
            gap: 0,
        }
    }

    pub fn on_start(mut self) -> Self {
        self.on_end = Some(false);
        self
    }

    pub fn on_end(mut self) -> Self {
        self.on_end = Some(true);
        self
    }

    pub fn with_gap(mut self, seconds: i64) -> Self {
        self.gap = seconds.max(0);
        self
    }
}

/// A request for one resource out of an ordered candidate list.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    pub candidates: Vec<ResourceId>,
    /// Once a candidate was booked, keep using it.
    pub persistent: bool,
    /// Slots where this allocation cannot be booked are not usable at all.
    pub mandatory: bool,
}

impl Allocation {
    pub fn new(candidates: Vec<ResourceId>) -> Self {
        Self {
            candidates,
            persistent: false,
            mandatory: false,
        }
    }

    pub fn single(resource: ResourceId) -> Self {
        Self::new(vec![resource])
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

/// A resolved dependency edge.
///
/// `on_end` names which endpoint of `task` the edge refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub task: TaskId,
    pub on_end: bool,
    pub gap: i64,
}

/// The four dependency edge kinds of one task in one scenario.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Links {
    pub start_preds: Vec<Link>,
    pub start_succs: Vec<Link>,
    pub end_preds: Vec<Link>,
    pub end_succs: Vec<Link>,
}

impl Links {
    pub fn clear(&mut self) {
        self.start_preds.clear();
        self.start_succs.clear();
        self.end_preds.clear();
        self.end_succs.clear();
    }

    /// Push unless an identical edge is already present.
    pub(crate) fn push_unique(list: &mut Vec<Link>, link: Link) {
        if !list.contains(&link) {
            list.push(link);
        }
    }
}

/// How much of what a task still needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkTarget {
    /// Calendar seconds.
    Duration(i64),
    /// Project working seconds.
    Length(i64),
    /// Booked resource working seconds, scaled by efficiency.
    Effort(i64),
    /// Run until the cursor reaches a fixed opposite bound.
    Until(NaiveDateTime),
    Milestone,
}

/// Transient per-scenario scheduling state of a task.
#[derive(Clone, Debug, Default)]
pub struct WorkState {
    /// Slot boundary the task continues from. Forward tasks book
    /// `[cursor, cursor + g)`, backward tasks `[cursor - g, cursor)`.
    pub cursor: Option<NaiveDateTime>,
    pub target: Option<WorkTarget>,
    pub done: i64,
    pub scheduled: bool,
    pub runaway: bool,
    /// Persistent allocations remember their chosen candidate here.
    pub locked: Vec<Option<ResourceId>>,
    /// `(slot index, resource)` pairs booked for this task.
    pub bookings: Vec<(usize, ResourceId)>,
}

impl WorkState {
    pub fn is_started(&self) -> bool {
        self.cursor.is_some()
    }
}

/// Scenario-scoped inputs and state of a task.
#[derive(Clone, Debug, Default)]
pub struct TaskScenario {
    /// `None` means not provided; parent scenarios then supply the value.
    pub depends: Option<Vec<Dependency>>,
    pub precedes: Option<Vec<Dependency>>,
    pub allocate: Option<Vec<Allocation>>,
    pub links: Links,
    pub work: WorkState,
}

#[derive(Clone, Debug)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// 1-based creation order; the final scheduling tie-breaker.
    pub seq: usize,
    pub parent: Option<TaskId>,
    pub children: Vec<TaskId>,
    pub attributes: PropertyAttributes,
    pub scenarios: Vec<TaskScenario>,
}

impl Task {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Scenario-scoped state of a resource.
#[derive(Clone, Debug, Default)]
pub struct ResourceScenario {
    pub schedule: ResourceSchedule,
}

#[derive(Clone, Debug)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub seq: usize,
    pub parent: Option<ResourceId>,
    pub children: Vec<ResourceId>,
    pub calendar: Calendar,
    pub attributes: PropertyAttributes,
    pub scenarios: Vec<ResourceScenario>,
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub seq: usize,
    pub parent: Option<ScenarioId>,
    pub children: Vec<ScenarioId>,
    pub attributes: PropertyAttributes,
}

fn def(
    id: &'static str,
    name: &'static str,
    kind: AttributeKind,
    inheritable: bool,
    scenario_specific: bool,
    default: AttributeValue,
) -> AttributeDefinition {
    AttributeDefinition::new(id, name, kind, inheritable, scenario_specific, default)
}

/// Attribute declarations for scenarios.
pub fn scenario_schema() -> AttributeSchema {
    use AttributeKind::*;
    use AttributeValue as V;
    AttributeSchema::new(vec![
        def("enabled", "Enabled", Boolean, true, false, V::Boolean(true)),
    ])
}

/// Attribute declarations for tasks.
pub fn task_schema() -> AttributeSchema {
    use AttributeKind::*;
    use AttributeValue as V;
    AttributeSchema::new(vec![
        def("criticalness", "Criticalness", Float, false, true, V::Float(0.0)),
        def("duration", "Duration", Duration, false, true, V::Duration(0)),
        def("effort", "Effort", Duration, false, true, V::Duration(0)),
        def("end", "End", Date, true, true, V::Date(None)),
        def("forward", "Scheduling", Boolean, true, true, V::Boolean(true)),
        def("index", "Index", Integer, false, false, V::Integer(-1)),
        def("length", "Length", Duration, false, true, V::Duration(0)),
        def("maxend", "Max. End", Date, true, true, V::Date(None)),
        def("maxstart", "Max. Start", Date, true, true, V::Date(None)),
        def("milestone", "Milestone", Boolean, false, true, V::Boolean(false)),
        def("minend", "Min. End", Date, true, true, V::Date(None)),
        def("minstart", "Min. Start", Date, true, true, V::Date(None)),
        def("note", "Note", Text, false, false, V::Text(String::new())),
        def("pathcriticalness", "Path Criticalness", Float, false, true, V::Float(0.0)),
        def("priority", "Priority", Integer, true, true, V::Integer(500)),
        def("scheduled", "Scheduled", Boolean, false, true, V::Boolean(false)),
        def("start", "Start", Date, true, true, V::Date(None)),
        def("wbs", "WBS", Text, false, false, V::Text(String::new())),
    ])
}

/// Attribute declarations for resources.
pub fn resource_schema() -> AttributeSchema {
    use AttributeKind::*;
    use AttributeValue as V;
    AttributeSchema::new(vec![
        def("alloctdeffort", "Alloctd. Effort", Float, false, true, V::Float(0.0)),
        def("criticalness", "Criticalness", Float, false, true, V::Float(0.0)),
        // Booking limits in working seconds; 0 means unlimited
        def("dailymax", "Daily Limit", Duration, true, true, V::Duration(0)),
        def("efficiency", "Efficiency", Float, true, true, V::Float(1.0)),
        def("email", "Email", Text, true, false, V::Text(String::new())),
        def("index", "Index", Integer, false, false, V::Integer(-1)),
        def("wbs", "WBS", Text, false, false, V::Text(String::new())),
        def("weeklymax", "Weekly Limit", Duration, true, true, V::Duration(0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_builder() {
        let dep = Dependency::new("build").on_start().with_gap(-5);
        assert_eq!(dep.target, "build");
        assert_eq!(dep.on_end, Some(false));
        assert_eq!(dep.gap, 0);
    }

    #[test]
    fn test_links_push_unique() {
        let mut links = Links::default();
        let link = Link {
            task: TaskId(3),
            on_end: true,
            gap: 0,
        };
        Links::push_unique(&mut links.start_preds, link);
        Links::push_unique(&mut links.start_preds, link);
        assert_eq!(links.start_preds.len(), 1);
        links.clear();
        assert!(links.start_preds.is_empty());
    }

    #[test]
    fn test_schemas_declare_scheduling_keys() {
        let tasks = task_schema();
        for key in ["priority", "pathcriticalness", "forward", "milestone", "start", "end"] {
            assert!(tasks.lookup(key).is_ok(), "missing {}", key);
        }
        let priority = tasks.definition(tasks.lookup("priority").unwrap());
        assert_eq!(priority.default, AttributeValue::Integer(500));
        assert!(priority.inheritable && priority.scenario_specific);

        let resources = resource_schema();
        for key in ["efficiency", "dailymax", "weeklymax"] {
            assert!(resources.lookup(key).is_ok(), "missing {}", key);
        }
        assert!(scenario_schema().lookup("enabled").is_ok());
    }
}
