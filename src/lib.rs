//! Monitor remote git repositories and run tasks for every remote on a schedule.
//!
//! ## How it works
//!
//! `grm` is built up from **triggers**, **discovery** and **tasks**.
//! Triggers are long running background processes that initiate the ticks
//! (a periodic schedule, or a stop signal). On every tick the discovery
//! lists the remote repositories to monitor by running an external command,
//! and the dispatcher submits one task per remote to a worker pool
//! (e.g. user-defined shell scripts that fetch or deploy the remote).
//!
//! ```ignore
//! +---------+       +-----------+       +-------+
//! | trigger | ----> | discovery | ----> | tasks |
//! +---------+       +-----------+       +-------+
//! ```
//!
//! Only one instance can run at a time: the monitor holds a lock file
//! for its whole lifetime and refuses to start while another live
//! instance holds it.

use thiserror::Error;

/// The command line arguments of the monitor.
pub mod args;
/// The discovery lists the remote repositories by running an external command
/// (e.g. [with a configured command](discovery::command::CommandDiscovery)).
pub mod discovery;
/// The dispatcher submits one task per discovered remote
/// (e.g. [to a worker pool](dispatch::worker::WorkerDispatcher)).
pub mod dispatch;
/// The lock prevents two instances from running at the same time
/// (e.g. [with a lock file](lock::file::FileLock)).
pub mod lock;
/// The logger writes to the terminal and to one log file per day.
pub mod logger;
/// A task is the unit of work that runs for a single remote
/// (e.g. [user-defined scripts](tasks::script::ScriptTask)).
pub mod tasks;
/// A trigger is a long running background process, which initiates the ticks
/// (e.g. [on a schedule](triggers::schedule::ScheduleTrigger), [on a signal](triggers::signal::SignalTrigger)
/// or [once](triggers::once::OnceTrigger)).
pub mod triggers;

/// The main monitor loop, that runs the triggers, discovery and dispatch infinitely.
pub mod start;

/// A generic result type for the main function.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// A custom error for the setup in the main function.
#[derive(Debug, Error)]
pub enum MainError {
    /// The local timezone cannot be detected for log timestamps.
    #[error("cannot set the local timezone for the logger")]
    FailedLoggerTimezones,
    /// The global logger cannot be initialized twice.
    #[error("cannot initialize the logger: {0}")]
    FailedLoggerInit(#[from] log::SetLoggerError),
}
