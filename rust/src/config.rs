//! Configuration for a scheduling run.

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Run-level scheduling options.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulingConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub verbosity: u8,
    /// Stop at the first failing scenario instead of continuing with the next.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub abort_on_failure: bool,
    /// Treat runaway tasks as post-scheduling failures of their scenario.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub escalate_runaways: bool,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            abort_on_failure: false,
            escalate_runaways: false,
        }
    }
}

impl SchedulingConfig {
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn aborting(mut self) -> Self {
        self.abort_on_failure = true;
        self
    }

    pub fn escalating_runaways(mut self) -> Self {
        self.escalate_runaways = true;
        self
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl SchedulingConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, abort_on_failure=None, escalate_runaways=None))]
    fn py_new(
        verbosity: Option<u8>,
        abort_on_failure: Option<bool>,
        escalate_runaways: Option<bool>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            abort_on_failure: abort_on_failure.unwrap_or(defaults.abort_on_failure),
            escalate_runaways: escalate_runaways.unwrap_or(defaults.escalate_runaways),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulingConfig(verbosity={}, abort_on_failure={}, escalate_runaways={})",
            self.verbosity, self.abort_on_failure, self.escalate_runaways
        )
    }
}
