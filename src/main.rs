use grm_bin::{
    args::parse_args,
    discovery::command::CommandDiscovery,
    dispatch::worker::WorkerDispatcher,
    lock::file::FileLock,
    logger::init_logger,
    start::start,
    triggers::{once::OnceTrigger, schedule::ScheduleTrigger, signal::SignalTrigger, Trigger},
    Result,
};
use std::{env, error::Error, path::PathBuf, process, time::Duration};

fn main() -> Result<()> {
    let args = parse_args();

    if args.version {
        println!("grm {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Setup logging.
    let log_dir = args
        .log_dir
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(default_log_dir);
    init_logger(&args, log_dir)?;

    // Setup the lock.
    let lock_file = args
        .lock_file
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(default_lock_file);
    let lock = FileLock::new(lock_file);

    // Setup triggers.
    let mut triggers: Vec<Box<dyn Trigger>> = vec![];
    if args.once {
        triggers.push(Box::new(OnceTrigger));
    } else {
        let duration: Duration = args.every.into();
        if !duration.is_zero() {
            triggers.push(Box::new(ScheduleTrigger::new(duration)));
        }
        triggers.push(Box::new(SignalTrigger::new()));
    }

    // Setup discovery.
    let command = args.command.ok_or(Box::<dyn Error>::from(String::from(
        "You have to pass a command that lists the remotes.",
    )))?;
    let timeout: Option<Duration> = args.timeout.map(Into::into);
    let discovery = CommandDiscovery::new(command, timeout);

    // Setup the dispatcher.
    if args.tasks.is_empty() {
        return Err(Box::<dyn Error>::from(String::from(
            "You have to pass at least one task to run (--task).",
        )));
    }
    let dispatcher = WorkerDispatcher::new(args.workers, args.tasks);

    // Start the monitor loop.
    match start(&lock, triggers, &discovery, &dispatcher) {
        Ok(()) => Ok(()),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn default_lock_file() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(env::temp_dir)
        .join("grm.lock")
}

fn default_log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(env::temp_dir)
        .join("grm")
}
