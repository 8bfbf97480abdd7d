use thiserror::Error;

/// A task that runs user-defined shell scripts for a remote.
pub mod script;

/// A custom error for describing the error cases for tasks
#[derive(Debug, Error)]
pub enum TaskError {
    /// Running the task failed.
    #[error("failed while running: {0}")]
    FailedTask(String),
}

/// A task is the unit of work that runs for a single remote on a tick.
///
/// Tasks are created fresh on every tick and run on the dispatcher's
/// workers, so a task failure never reaches back into the monitor loop.
///
/// Tasks may include:
///   - running user-defined scripts ([script::ScriptTask])
///   - etc.
pub trait Task: Send {
    /// Run the work for the remote this task was created for.
    fn run(&self) -> Result<(), TaskError>;
}
