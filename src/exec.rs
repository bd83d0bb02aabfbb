//! External child-process collaborator contract.
//!
//! Spawning and watchdog-killing live outside this crate; cases only consume
//! the outcome. The one rule that matters here: a watchdog kill is a distinct
//! failure from a non-zero exit, and the two must never be conflated. A hang
//! reported as "the program returned an error" sends the investigation the
//! wrong way.

use std::time::Duration;

use crate::core::errors::{HarnessError, Result};

/// Terminal state of a watched child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own.
    Exited {
        /// Raw exit code.
        code: i32,
    },
    /// The watchdog terminated the process after the configured limit.
    TimedOut {
        /// The limit that was exceeded.
        limit: Duration,
    },
}

/// A child process owned by an external spawner, observable by cases.
pub trait ManagedProcess {
    /// OS process id.
    fn pid(&self) -> u32;

    /// Executable name, for diagnostics.
    fn exe(&self) -> &str;

    /// Block until the process reaches a terminal state.
    fn wait(&mut self) -> Result<ProcessOutcome>;
}

/// Map an outcome to `Ok(())` for a clean exit, or the matching error kind
/// otherwise.
pub fn ensure_success(exe: &str, outcome: ProcessOutcome) -> Result<()> {
    match outcome {
        ProcessOutcome::Exited { code: 0 } => Ok(()),
        ProcessOutcome::Exited { code } => Err(HarnessError::ProcessFailed {
            exe: exe.to_string(),
            code,
        }),
        ProcessOutcome::TimedOut { limit } => Err(HarnessError::ProcessTimedOut {
            exe: exe.to_string(),
            limit,
        }),
    }
}
