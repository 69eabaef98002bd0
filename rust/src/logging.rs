//! Progress tracing for a scheduling run, written to stderr.
//!
//! `SchedulingConfig::verbosity` picks how much of a run is traced. Problems
//! found in the project itself go to the message handler, never through here.
//! - 0: nothing is traced
//! - 1: scenario starts and failures, task placements, runaways, tasks left
//!   unscheduled
//! - 2: priority groups as they lock, tasks skipped or deferred in a pass
//! - 3: resolver phases, container spans and every slot attempt

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Trace a change to the schedule: a placement, runaway or failed scenario.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Trace a scheduler decision that changes nothing by itself.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!($($arg)*);
        }
    };
}

/// Trace fine-grained resolver and per-slot detail.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_silent_macros_expand() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "placed {}", "a");
        log_checks!(verbosity, "group {}", 1);
        log_debug!(verbosity, "slot {}", 2);
    }
}
