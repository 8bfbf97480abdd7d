use mockall::automock;
use std::sync::mpsc::SyncSender;
use thiserror::Error;

/// A trigger that starts the ticks once and then exits.
pub mod once;
/// A trigger that starts the ticks periodically.
pub mod schedule;
/// A trigger that stops the monitor on a signal.
pub mod signal;

/// A custom error for describing the error cases for triggers
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Cannot initialize trigger, because it has a misconfiguration.
    #[error("not configured correctly: {0}")]
    Misconfigured(String),
    /// Cannot send trigger with Sender. This usually because the receiver is dropped.
    #[error("cannot start tick, receiver hang up")]
    ReceiverHangup(#[from] std::sync::mpsc::SendError<Option<()>>),
    /// Running the trigger failed.
    #[error("{0}")]
    FailedTrigger(String),
}

/// A trigger is a long running background process, which initiates the ticks.
///
/// A `Some(())` message starts one tick, a `None` message asks the monitor
/// to stop. The channel is a rendezvous channel: a send only completes when
/// the monitor loop accepts the message, so ticks cannot pile up behind a
/// tick that runs longer than its schedule.
///
/// Triggers may include:
///   - schedules ([schedule::ScheduleTrigger])
///   - signal handlers ([signal::SignalTrigger])
///   - etc.
#[automock]
pub trait Trigger: Sync + Send {
    /// Start the trigger process.
    fn listen(&self, tx: SyncSender<Option<()>>) -> Result<(), TriggerError>;
}
