use crate::tasks::Task;
use mockall::automock;
use std::sync::mpsc::SendError;
use thiserror::Error;

/// A dispatcher that submits the tasks to a pool of worker threads.
pub mod worker;

/// A task, boxed so it can be sent to another thread for execution.
pub type BoxedTask = Box<dyn Task>;

/// A custom error for describing the error cases for dispatchers
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Cannot submit tasks, because every worker is gone.
    #[error("cannot submit tasks, workers hang up")]
    ReceiverHangup(#[from] SendError<BoxedTask>),
}

/// A dispatcher submits one task for every discovered remote.
///
/// Submission is fire-and-forget: the dispatcher hands the tasks over to an
/// execution context of its own (worker threads, processes, etc.) and returns
/// without waiting for any of them to finish.
#[automock]
pub trait Dispatcher {
    /// Submit one task per remote, in the order the remotes were discovered.
    /// Duplicate remotes each get their own task.
    fn dispatch(&self, remotes: &[String]) -> Result<(), DispatchError>;
}
