use super::{Trigger, TriggerError};
use duration_string::DurationString;
use log::info;
use std::{
    sync::mpsc::SyncSender,
    thread::sleep,
    time::{Duration, Instant},
};
use thiserror::Error;

/// A trigger that starts a tick periodically.
///
/// The duration is measured from the moment the monitor loop accepted the
/// previous tick: a tick that finishes early waits out the remainder, while
/// a tick that overruns is followed by the next one as soon as the loop is
/// ready again.
pub struct ScheduleTrigger {
    duration: Duration,
    timeout: Option<Duration>,
}

/// Custom error describing the error cases for the ScheduleTrigger.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Cannot send trigger with Sender. This usually because the receiver is dropped.
    #[error("cannot start tick, receiver hang up")]
    ReceiverHangup(#[from] std::sync::mpsc::SendError<Option<()>>),
}

impl From<ScheduleError> for TriggerError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::ReceiverHangup(err) => TriggerError::ReceiverHangup(err),
        }
    }
}

impl ScheduleTrigger {
    /// Creates a new ScheduleTrigger with duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            timeout: None,
        }
    }

    /// Creates a new ScheduleTrigger with duration and timeout.
    pub fn new_with_timeout(duration: Duration, timeout: Duration) -> Self {
        Self {
            duration,
            timeout: Some(timeout),
        }
    }

    /// Runs one step in the scheduled time process: hands one tick to the
    /// loop, then waits until the next tick is due. The handover blocks while
    /// the loop is busy with the previous tick. Returns true if it should
    /// continue, false when the final timeout is reached; in case of an
    /// error it terminates.
    pub fn step(
        &self,
        tx: SyncSender<Option<()>>,
        final_timeout: Option<Instant>,
    ) -> Result<bool, ScheduleError> {
        tx.send(Some(()))?;
        let next_check = Instant::now() + self.duration;

        if let Some(final_timeout) = final_timeout {
            if next_check > final_timeout {
                sleep(final_timeout.saturating_duration_since(Instant::now()));
                return Ok(false);
            }
        }

        sleep(next_check.saturating_duration_since(Instant::now()));
        Ok(true)
    }
}

impl Trigger for ScheduleTrigger {
    /// Starts a scheduled trigger on a new thread, starting the steps in a loop.
    /// Every step starts one tick and then waits the given duration. In case
    /// of an error it terminates, or if it reaches the final timeout it waits
    /// until the end of the timeout and returns.
    fn listen(&self, tx: SyncSender<Option<()>>) -> Result<(), TriggerError> {
        let final_timeout = self.timeout.map(|t| Instant::now() + t);
        info!(
            "Starting schedule in every {}.",
            DurationString::new(self.duration)
        );

        loop {
            let should_continue = self.step(tx.clone(), final_timeout)?;
            if !should_continue {
                break;
            }
        }

        Ok(())
    }
}
