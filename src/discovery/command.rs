use super::{Discovery, DiscoveryError};
use duct::{cmd, Handle};
use log::{debug, warn};
use std::{
    process::Output,
    thread::sleep,
    time::{Duration, Instant},
};

/// The fixed subcommand that makes the configured command list its remotes.
const REMOTES_SUBCOMMAND: &str = "remotes";

/// How often a running command is polled while waiting for the timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A discovery that runs an external command to list the remotes.
///
/// The command is called with a single `remotes` subcommand and has to print
/// one remote URL per line on stdout with a zero exit code. Stderr is merged
/// into the captured output, so failures carry everything the command said.
/// If a timeout is configured, a command running longer is killed and
/// reported as failed.
pub struct CommandDiscovery {
    command: String,
    timeout: Option<Duration>,
}

impl CommandDiscovery {
    /// Creates a discovery running the given command, with an optional timeout.
    pub fn new(command: String, timeout: Option<Duration>) -> Self {
        CommandDiscovery { command, timeout }
    }

    fn start_command(&self) -> Result<Handle, DiscoveryError> {
        let mut split_args = shlex::split(&self.command)
            .filter(|args| !args.is_empty())
            .ok_or_else(|| DiscoveryError::Misconfigured(self.command.clone()))?;
        split_args.push(String::from(REMOTES_SUBCOMMAND));

        let (program, args) = match split_args.split_first() {
            Some(parts) => parts,
            None => return Err(DiscoveryError::Misconfigured(self.command.clone())),
        };

        let handle = cmd(program, args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()?;

        Ok(handle)
    }

    fn wait_with_timeout<'a>(
        &self,
        handle: &'a Handle,
        timeout: Duration,
    ) -> Result<&'a Output, DiscoveryError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait()? {
                return Ok(output);
            }
            if Instant::now() >= deadline {
                warn!("The remotes command did not finish in time, killing it.");
                handle.kill()?;
                return Ok(handle.wait()?);
            }
            sleep(POLL_INTERVAL);
        }
    }
}

impl Discovery for CommandDiscovery {
    /// Run the remotes command synchronously and split its output into lines.
    ///
    /// A zero exit code yields the trimmed, non-empty output lines in the
    /// order the command printed them. Any other exit code (including a kill
    /// after the timeout) is an error carrying the exit code and the output.
    fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        debug!("Listing remotes with: {} {REMOTES_SUBCOMMAND}.", self.command);

        let handle = self.start_command()?;
        let output = match self.timeout {
            Some(timeout) => self.wait_with_timeout(&handle, timeout)?,
            None => handle.wait()?,
        };

        if output.status.success() {
            let stdout =
                std::str::from_utf8(&output.stdout).map_err(|_| DiscoveryError::NonUtf8Output)?;
            let remotes = stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();

            Ok(remotes)
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout)
                .trim_end()
                .to_string();

            Err(DiscoveryError::CommandFailed(
                output.status.code().unwrap_or(-1),
                stdout,
            ))
        }
    }
}
