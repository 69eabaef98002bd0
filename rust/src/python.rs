//! Python bindings, built with the `python` feature.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::attributes::AttributeValue;
use crate::config::SchedulingConfig;
use crate::coordinator::ScenarioOutcome;
use crate::error::ScheduleError;
use crate::models::{Allocation, Dependency, ScenarioId, TaskId};
use crate::project::Project;

fn value_error(e: ScheduleError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// A project that can be built up and scheduled from Python.
#[pyclass(name = "Project", unsendable)]
pub struct PyProject {
    inner: Project,
}

impl PyProject {
    fn task_id(&self, id: &str) -> PyResult<TaskId> {
        self.inner
            .task(id)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown task {}", id)))
    }

    fn scenario_id(&self, id: &str) -> PyResult<ScenarioId> {
        self.inner
            .scenario(id)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown scenario {}", id)))
    }

    fn set(&mut self, task: &str, scenario: &str, key: &str, value: AttributeValue) -> PyResult<()> {
        let t = self.task_id(task)?;
        let sc = self.scenario_id(scenario)?;
        self.inner.set_task_attr(t, sc, key, value).map_err(value_error)
    }
}

#[pymethods]
impl PyProject {
    #[new]
    #[pyo3(signature = (id, name, start, end, granularity=3600))]
    fn new(id: &str, name: &str, start: NaiveDateTime, end: NaiveDateTime, granularity: i64) -> Self {
        let mut inner = Project::new(id, name);
        inner.set_bounds(start, end).set_granularity(granularity);
        Self { inner }
    }

    #[pyo3(signature = (id, name, parent=None))]
    fn add_scenario(&mut self, id: &str, name: &str, parent: Option<&str>) -> PyResult<()> {
        self.inner
            .add_scenario(id, name, parent)
            .map(|_| ())
            .map_err(value_error)
    }

    #[pyo3(signature = (id, name, parent=None))]
    fn add_task(&mut self, id: &str, name: &str, parent: Option<&str>) -> PyResult<()> {
        let parent = parent.map(|p| self.task_id(p)).transpose()?;
        self.inner
            .add_task(id, name, parent)
            .map(|_| ())
            .map_err(value_error)
    }

    #[pyo3(signature = (id, name, parent=None))]
    fn add_resource(&mut self, id: &str, name: &str, parent: Option<&str>) -> PyResult<()> {
        let parent = match parent {
            Some(p) => Some(
                self.inner
                    .resource(p)
                    .ok_or_else(|| PyValueError::new_err(format!("Unknown resource {}", p)))?,
            ),
            None => None,
        };
        self.inner
            .add_resource(id, name, parent)
            .map(|_| ())
            .map_err(value_error)
    }

    /// Set a date attribute such as `start`, `end` or `maxend`.
    #[pyo3(signature = (task, key, value, scenario="plan"))]
    fn set_date(
        &mut self,
        task: &str,
        key: &str,
        value: Option<NaiveDateTime>,
        scenario: &str,
    ) -> PyResult<()> {
        self.set(task, scenario, key, AttributeValue::Date(value))
    }

    /// Set a span attribute (`duration`, `length` or `effort`) in seconds.
    #[pyo3(signature = (task, key, seconds, scenario="plan"))]
    fn set_span(&mut self, task: &str, key: &str, seconds: i64, scenario: &str) -> PyResult<()> {
        self.set(task, scenario, key, AttributeValue::Duration(seconds))
    }

    #[pyo3(signature = (task, priority, scenario="plan"))]
    fn set_priority(&mut self, task: &str, priority: i64, scenario: &str) -> PyResult<()> {
        self.set(task, scenario, "priority", AttributeValue::Integer(priority))
    }

    #[pyo3(signature = (task, scenario="plan"))]
    fn set_milestone(&mut self, task: &str, scenario: &str) -> PyResult<()> {
        self.set(task, scenario, "milestone", AttributeValue::Boolean(true))
    }

    #[pyo3(signature = (task, target, gap=0, on_end=None, scenario="plan"))]
    fn add_dependency(
        &mut self,
        task: &str,
        target: &str,
        gap: i64,
        on_end: Option<bool>,
        scenario: &str,
    ) -> PyResult<()> {
        let t = self.task_id(task)?;
        let sc = self.scenario_id(scenario)?;
        let mut dep = Dependency::new(target).with_gap(gap);
        dep.on_end = on_end;
        self.inner.add_dependency(t, sc, dep);
        Ok(())
    }

    #[pyo3(signature = (task, resources, persistent=false, mandatory=false, scenario="plan"))]
    fn allocate(
        &mut self,
        task: &str,
        resources: Vec<String>,
        persistent: bool,
        mandatory: bool,
        scenario: &str,
    ) -> PyResult<()> {
        let t = self.task_id(task)?;
        let sc = self.scenario_id(scenario)?;
        let candidates = resources
            .iter()
            .map(|r| {
                self.inner
                    .resource(r)
                    .ok_or_else(|| PyValueError::new_err(format!("Unknown resource {}", r)))
            })
            .collect::<PyResult<Vec<_>>>()?;
        let mut allocation = Allocation::new(candidates);
        allocation.persistent = persistent;
        allocation.mandatory = mandatory;
        self.inner.add_allocation(t, sc, allocation);
        Ok(())
    }

    /// Schedule all scenarios and return a status per scenario id.
    ///
    /// # Raises
    /// * ValueError if the project setup itself is invalid
    #[pyo3(signature = (config=None))]
    fn schedule(&mut self, config: Option<SchedulingConfig>) -> PyResult<HashMap<String, String>> {
        let report = self.inner.schedule(&config.unwrap_or_default());
        if let Some(e) = report.setup_error {
            return Err(value_error(e));
        }
        Ok(report
            .scenarios
            .into_iter()
            .map(|r| {
                let status = match r.outcome {
                    ScenarioOutcome::Scheduled { cancelled: true, .. } => "cancelled".to_string(),
                    ScenarioOutcome::Scheduled { .. } => "scheduled".to_string(),
                    ScenarioOutcome::Failed(e) => format!("failed: {}", e),
                    ScenarioOutcome::Skipped => "skipped".to_string(),
                    ScenarioOutcome::Disabled => "disabled".to_string(),
                };
                (r.scenario, status)
            })
            .collect())
    }

    #[pyo3(signature = (task, scenario="plan"))]
    fn span(&self, task: &str, scenario: &str) -> PyResult<Option<(NaiveDateTime, NaiveDateTime)>> {
        self.inner
            .task_span(self.task_id(task)?, self.scenario_id(scenario)?)
            .map_err(value_error)
    }

    fn messages(&self) -> Vec<String> {
        self.inner
            .messages()
            .messages()
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "Project(tasks={}, resources={}, scenarios={})",
            self.inner.task_ids().count(),
            self.inner.resource_ids().count(),
            self.inner.scenario_ids().count()
        )
    }
}

/// The skedge.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyProject>()?;
    m.add_class::<SchedulingConfig>()?;
    Ok(())
}
