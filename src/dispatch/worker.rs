use super::{BoxedTask, DispatchError, Dispatcher};
use crate::tasks::script::ScriptTask;
use log::{debug, error};
use std::{
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread,
};

/// A dispatcher that runs the tasks on a fixed pool of worker threads.
///
/// The workers are detached: nothing waits for an in-flight task when the
/// monitor shuts down, and a slow task only delays the tasks queued behind
/// it, never the monitor loop itself.
pub struct WorkerDispatcher {
    scripts: Vec<String>,
    tx: Sender<BoxedTask>,
}

impl WorkerDispatcher {
    /// Creates a dispatcher with the given pool size, building one
    /// [ScriptTask] with the given scripts for every submitted remote.
    pub fn new(pool_size: usize, scripts: Vec<String>) -> Self {
        let (tx, rx) = channel::<BoxedTask>();
        let rx = Arc::new(Mutex::new(rx));
        for worker in 0..pool_size.max(1) {
            let rx = Arc::clone(&rx);
            thread::spawn(move || run_worker(worker, rx));
        }

        WorkerDispatcher { scripts, tx }
    }
}

impl Dispatcher for WorkerDispatcher {
    /// Submit one task per remote to the worker pool, without waiting for
    /// any task to run.
    fn dispatch(&self, remotes: &[String]) -> Result<(), DispatchError> {
        for remote in remotes {
            let task = ScriptTask::new(remote.clone(), self.scripts.clone());
            self.tx.send(Box::new(task))?;
        }

        Ok(())
    }
}

/// Take tasks off the shared queue until the dispatcher is dropped.
/// A failing task is logged and never takes the worker down with it.
fn run_worker(worker: usize, rx: Arc<Mutex<Receiver<BoxedTask>>>) {
    loop {
        let task = match rx.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => break,
        };

        match task {
            Ok(task) => {
                if let Err(err) = task.run() {
                    error!("Task failed: {err}.");
                }
            }
            Err(_) => break,
        }
    }

    debug!("Worker {worker} finished.");
}
