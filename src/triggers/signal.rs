use super::{Trigger, TriggerError};
use log::debug;
use std::sync::{atomic::AtomicU8, mpsc::SyncSender};

/// A trigger that stops the monitor on a signal.
///
/// The first termination signal asks the monitor to stop, which is honored
/// after the tick that is currently running finished. A second signal
/// terminates the process right away.
pub struct SignalTrigger {
    trigger_count: AtomicU8,
}

impl SignalTrigger {
    pub fn new() -> SignalTrigger {
        SignalTrigger {
            trigger_count: AtomicU8::new(0),
        }
    }

    #[cfg(unix)]
    fn listen_inner<I>(&self, tx: SyncSender<Option<()>>, signals: I) -> Result<(), TriggerError>
    where
        I: IntoIterator<Item = i32>,
    {
        use log::error;
        use std::{process, sync::atomic::Ordering, thread, thread::sleep, time::Duration};
        for signal in signals.into_iter() {
            let previous = self.trigger_count.fetch_add(1, Ordering::Acquire);
            if previous == 0 {
                debug!("Got signal {signal}, stopping after the current tick finished.");
                // Send from a helper thread: the handover can block on a
                // running tick, and a second signal still has to get through.
                let tx = tx.clone();
                thread::spawn(move || {
                    if tx.send(None).is_err() {
                        error!("Failed stopping the monitor with signal {signal}.");
                    }
                });
            } else {
                // Allow a little time for the clean shutdown to still happen.
                sleep(Duration::from_millis(100));
                debug!("Got signal {signal}, terminating right now.");
                process::exit(signal);
            }
        }

        Ok(())
    }
}

impl Default for SignalTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Trigger for SignalTrigger {
    /// Starts a trigger that iterates over signals and stops the monitor.
    #[cfg(unix)]
    fn listen(&self, tx: SyncSender<Option<()>>) -> Result<(), TriggerError> {
        use log::warn;
        use signal_hook::{
            consts::TERM_SIGNALS,
            iterator::{exfiltrator::SignalOnly, SignalsInfo},
        };
        let signals = SignalsInfo::<SignalOnly>::new(TERM_SIGNALS);
        if let Ok(mut signals) = signals {
            self.listen_inner(tx, &mut signals)?;
        } else {
            warn!("Failed setting up signal handler.");
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn listen(&self, _tx: SyncSender<Option<()>>) -> Result<(), TriggerError> {
        debug!("Signal handlers are not supported on non-unix systems.");

        Ok(())
    }
}
