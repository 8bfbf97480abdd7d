use super::{Trigger, TriggerError};
use std::sync::mpsc::SyncSender;

/// A trigger that starts the ticks once and then exits.
pub struct OnceTrigger;

impl Trigger for OnceTrigger {
    /// Starts a trigger that runs one tick and stops the monitor after.
    fn listen(&self, tx: SyncSender<Option<()>>) -> Result<(), TriggerError> {
        tx.send(Some(()))?;
        tx.send(None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc, thread};

    #[test]
    fn it_should_trigger_once_and_stop() {
        let (tx, rx) = mpsc::sync_channel::<Option<()>>(0);

        let handle = thread::spawn(move || OnceTrigger.listen(tx));

        let msgs: Vec<_> = rx.iter().collect();
        assert_eq!(vec![Some(()), None], msgs);
        handle.join().unwrap().unwrap();
    }
}
