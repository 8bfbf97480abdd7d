use crate::{
    discovery::{Discovery, DiscoveryError},
    dispatch::{DispatchError, Dispatcher},
    lock::{Lock, LockError},
    triggers::{Trigger, TriggerError},
};
use log::{debug, error, info};
use std::{
    sync::mpsc::{self, Receiver},
    thread,
};
use thiserror::Error;

/// A custom error implementation for the start function
#[derive(Debug, Error)]
pub enum StartError {
    #[error("You have to define at least one trigger.")]
    NoTriggers,
    #[error("Lock failed: {0}.")]
    FailedLock(#[from] LockError),
    #[error("Trigger failed: {0}.")]
    MisconfiguredTrigger(#[from] TriggerError),
    #[error("Discovery failed: {0}.")]
    FailedDiscovery(#[from] DiscoveryError),
    #[error("Dispatch failed: {0}.")]
    FailedDispatch(#[from] DispatchError),
}

/// The state of the monitor after setup. The monitor keeps running ticks
/// until a trigger asks it to stop (Stopped, the process exits cleanly) or
/// a tick fails on discovery or dispatch (Fatal, the process exits with a
/// non-zero code).
enum State {
    Running { sequence: u64 },
    Stopped,
    Fatal(StartError),
}

/// The main monitor loop, that runs the triggers, discovery and dispatch infinitely.
///
/// The lock is acquired before anything else: a second instance fails here,
/// without any further side effect. The lock is released again on every way
/// out of this function, clean or failed.
pub fn start(
    lock: &dyn Lock,
    triggers: Vec<Box<dyn Trigger>>,
    discovery: &dyn Discovery,
    dispatcher: &dyn Dispatcher,
) -> Result<(), StartError> {
    let _guard = lock.acquire()?;

    if triggers.is_empty() {
        return Err(StartError::NoTriggers);
    }

    info!("Remote monitor setup complete.");

    // Rendezvous channel: a tick is only handed over when the loop is ready,
    // so a tick that overruns its schedule never piles up ticks behind it.
    let (tx, rx) = mpsc::sync_channel::<Option<()>>(0);

    for trigger in triggers {
        let tx = tx.clone();
        thread::spawn(move || {
            let result = trigger.listen(tx);
            if let Err(err) = result {
                error!("Trigger failed: {err}.");
            }
        });
    }

    debug!("Waiting on triggers.");
    let mut state = State::Running { sequence: 1 };
    loop {
        state = match state {
            State::Running { sequence } => next_state(&rx, discovery, dispatcher, sequence),
            State::Stopped => {
                debug!("Finished running.");
                return Ok(());
            }
            State::Fatal(err) => {
                error!("Monitor failed, shutting down: {err}");
                return Err(err);
            }
        };
    }
}

/// Wait for the next trigger message and run one tick for it. A stop
/// request, or every trigger hanging up, stops the monitor instead.
fn next_state(
    rx: &Receiver<Option<()>>,
    discovery: &dyn Discovery,
    dispatcher: &dyn Dispatcher,
    sequence: u64,
) -> State {
    match rx.recv() {
        Ok(Some(())) => run_tick(discovery, dispatcher, sequence),
        Ok(None) | Err(_) => State::Stopped,
    }
}

/// Run one tick: list the remotes and submit one task per remote, in the
/// order the discovery returned them. A discovery or dispatch failure is
/// fatal; the tasks themselves run decoupled and cannot fail the tick.
fn run_tick(discovery: &dyn Discovery, dispatcher: &dyn Dispatcher, sequence: u64) -> State {
    debug!("Tick {sequence}: listing remotes.");

    let remotes = match discovery.discover() {
        Ok(remotes) => remotes,
        Err(err) => return State::Fatal(err.into()),
    };

    info!("Monitoring {} remotes.", remotes.len());

    match dispatcher.dispatch(&remotes) {
        Ok(()) => State::Running {
            sequence: sequence + 1,
        },
        Err(err) => State::Fatal(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        discovery::MockDiscovery,
        dispatch::MockDispatcher,
        lock::{file::FileLock, LockGuard, MockLock},
        triggers::{MockTrigger, Trigger},
    };
    use mockall::Sequence;

    fn detached_lock() -> MockLock {
        let mut mock_lock = MockLock::new();
        mock_lock
            .expect_acquire()
            .returning(|| Ok(LockGuard::detached()));
        mock_lock
    }

    #[test]
    fn it_should_dispatch_the_remotes_of_every_tick_in_order() {
        let mock_lock = detached_lock();

        // Two ticks, then a stop request.
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(()))?;
            tx.send(Some(()))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut discovery_seq = Sequence::new();
        let mut mock_discovery = MockDiscovery::new();
        mock_discovery
            .expect_discover()
            .times(1)
            .in_sequence(&mut discovery_seq)
            .returning(|| Ok(vec![String::from("a"), String::from("b")]));
        mock_discovery
            .expect_discover()
            .times(1)
            .in_sequence(&mut discovery_seq)
            .returning(|| Ok(vec![String::from("b")]));

        let mut dispatch_seq = Sequence::new();
        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher
            .expect_dispatch()
            .withf(|remotes| remotes.to_vec() == vec!["a", "b"])
            .times(1)
            .in_sequence(&mut dispatch_seq)
            .returning(|_| Ok(()));
        mock_dispatcher
            .expect_dispatch()
            .withf(|remotes| remotes.to_vec() == vec!["b"])
            .times(1)
            .in_sequence(&mut dispatch_seq)
            .returning(|_| Ok(()));

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(result.is_ok());
    }

    #[test]
    fn it_should_dispatch_an_empty_discovery_result() {
        let mock_lock = detached_lock();

        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(()))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery
            .expect_discover()
            .times(1)
            .returning(|| Ok(vec![]));

        // An empty tick is not an error: dispatch still runs, with no remotes.
        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher
            .expect_dispatch()
            .withf(|remotes| remotes.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(result.is_ok());
    }

    #[test]
    fn it_should_stop_on_a_discovery_failure() {
        let mock_lock = detached_lock();

        // The trigger would keep going, but the first tick already fails.
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(()))?;
            tx.send(Some(()))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery
            .expect_discover()
            .times(1)
            .returning(|| Err(DiscoveryError::CommandFailed(1, String::from("broken"))));

        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher.expect_dispatch().times(0);

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(
            matches!(
                result,
                Err(StartError::FailedDiscovery(DiscoveryError::CommandFailed(
                    1,
                    _
                )))
            ),
            "{result:?} should be FailedDiscovery"
        );
    }

    #[test]
    fn it_should_fail_without_triggers() {
        let mock_lock = detached_lock();

        // Setup empty triggers.
        let triggers: Vec<Box<dyn Trigger>> = vec![];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery.expect_discover().times(0);

        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher.expect_dispatch().times(0);

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(matches!(result, Err(StartError::NoTriggers)));
    }

    #[test]
    fn it_should_fail_while_the_lock_is_held() {
        let mut mock_lock = MockLock::new();
        mock_lock
            .expect_acquire()
            .times(1)
            .returning(|| Err(LockError::AlreadyHeld(4242)));

        // Nothing else runs: no trigger, no tick, no setup side effects.
        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().times(0);
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery.expect_discover().times(0);

        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher.expect_dispatch().times(0);

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(
            matches!(result, Err(StartError::FailedLock(LockError::AlreadyHeld(4242)))),
            "{result:?} should be FailedLock"
        );
    }

    #[test]
    fn it_should_release_the_lock_file_after_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grm.lock");
        let lock = FileLock::new(path.clone());

        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(()))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery
            .expect_discover()
            .returning(|| Ok(vec![String::from("a")]));

        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher.expect_dispatch().returning(|_| Ok(()));

        let result = start(&lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(result.is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn it_should_log_the_monitored_remote_count() {
        testing_logger::setup();

        let mock_lock = detached_lock();

        let mut mock_trigger = MockTrigger::new();
        mock_trigger.expect_listen().returning(|tx| {
            tx.send(Some(()))?;
            tx.send(None)?;
            Ok(())
        });
        let triggers: Vec<Box<dyn Trigger>> = vec![Box::new(mock_trigger)];

        let mut mock_discovery = MockDiscovery::new();
        mock_discovery
            .expect_discover()
            .returning(|| Ok(vec![String::from("a"), String::from("b")]));

        let mut mock_dispatcher = MockDispatcher::new();
        mock_dispatcher.expect_dispatch().returning(|_| Ok(()));

        let result = start(&mock_lock, triggers, &mock_discovery, &mock_dispatcher);
        assert!(result.is_ok());

        testing_logger::validate(|captured_logs| {
            assert!(captured_logs
                .iter()
                .any(|log| log.body == "Monitoring 2 remotes."));
        });
    }
}
