//! Report hooks run after scheduling.

use crate::attributes::AttributeValue;
use crate::error::ReportError;
use crate::project::Project;

/// Something generated from a scheduled project.
///
/// Report failures never affect scheduling results.
pub trait Report {
    fn name(&self) -> &str;

    fn generate(&self, project: &Project) -> Result<(), ReportError>;
}

/// Plain text list of task spans for one scenario, written to stdout.
#[derive(Clone, Debug)]
pub struct TaskListReport {
    name: String,
    scenario: String,
}

impl TaskListReport {
    pub fn new(name: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenario: scenario.into(),
        }
    }

    /// One line per task in tree order: wbs, id, start and end.
    pub fn render(&self, project: &Project) -> Result<String, ReportError> {
        let sc = project
            .scenario(&self.scenario)
            .ok_or_else(|| ReportError::Generation {
                report: self.name.clone(),
                reason: format!("unknown scenario {}", self.scenario),
            })?;
        let mut out = String::new();
        let mut any = false;
        for task in project.tasks_top_down() {
            let t = project.task_ref(task);
            let wbs = project
                .task_attr(task, sc, "wbs")
                .ok()
                .and_then(|a| match &a.value {
                    AttributeValue::Text(s) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| "-".to_string());
            let span = project
                .task_span(task, sc)
                .map_err(|e| ReportError::Generation {
                    report: self.name.clone(),
                    reason: e.to_string(),
                })?;
            let span = match span {
                Some((start, end)) => {
                    any = true;
                    format!("{}  {}", start, end)
                }
                None if project.is_runaway(task, sc) => "runaway".to_string(),
                None => "unscheduled".to_string(),
            };
            out.push_str(&format!("{:<8} {:<16} {}\n", wbs, t.id, span));
        }
        if !any && !project.root_tasks().is_empty() {
            return Err(ReportError::NotScheduled(self.name.clone()));
        }
        Ok(out)
    }
}

impl Report for TaskListReport {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, project: &Project) -> Result<(), ReportError> {
        print!("{}", self.render(project)?);
        Ok(())
    }
}
