use duration_string::DurationString;
use gumdrop::Options;

/// Monitor remote git repositories and run tasks for every remote on a schedule.
#[derive(Debug, Options)]
pub struct Args {
    /// The command that lists the remote repositories to monitor.
    ///
    /// It is called with a single `remotes` subcommand and has to print
    /// one remote URL per line on stdout.
    #[options(free)]
    pub command: Option<String>,

    /// The script to run for every remote, you can define multiple times.
    ///
    /// The scripts get the remote URL in the GRM_REMOTE_URL environment variable.
    #[options(long = "task")]
    pub tasks: Vec<String>,

    /// Check the remotes only once. Useful for cronjobs.
    #[options()]
    pub once: bool,

    /// Check the remotes with this delay.
    ///
    /// Can be a number postfixed with s(econd), m(inutes), h(ours), d(ays)
    #[options(long = "every", default = "1s")]
    pub every: DurationString,

    /// Kill the remote listing command if it runs longer than this duration.
    #[options(no_short)]
    pub timeout: Option<DurationString>,

    /// The number of worker threads that run the tasks.
    #[options(no_short, default = "4")]
    pub workers: usize,

    /// The lock file that prevents two instances from running.
    #[options(no_short, long = "lock-file")]
    pub lock_file: Option<String>,

    /// The directory where the daily log files are written.
    #[options(no_short, long = "log-dir")]
    pub log_dir: Option<String>,

    /// Only print error level logs.
    #[options()]
    pub quiet: bool,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}
