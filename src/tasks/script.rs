use super::{Task, TaskError};
use duct_sh::sh_dangerous;
use log::{debug, error};
use thiserror::Error;

const TASK_NAME: &str = "SCRIPT";

/// A task that runs the configured shell scripts for one remote.
///
/// The scripts run in a subshell (`/bin/sh` on *nix, `cmd.exe` on Windows),
/// so they can use any feature in these shells: variable expansion, pipes,
/// redirection. The remote URL is passed in the GRM_REMOTE_URL environment
/// variable. Both stdout and stderr are captured and logged. The scripts run
/// in order and the first failure skips the remaining ones.
pub struct ScriptTask {
    url: String,
    scripts: Vec<String>,
}

/// Custom error describing the error cases for the ScriptTask.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The underlying Rust command creation failed. The parameter contains the error.
    #[error("the script cannot run: {0}")]
    ScriptFailure(#[from] std::io::Error),
    /// The script returned a non-zero exit code, usually meaning it failed to start
    /// or encountered an error. The parameters are the exit code and the failed output.
    #[error("the script returned non-zero exit code {0} with message: {1}")]
    NonZeroExitcode(i32, String),
    /// The script output contains non-UTF8 characters.
    #[error("the script returned invalid characters")]
    NonUtf8Return,
}

impl From<ScriptError> for TaskError {
    fn from(value: ScriptError) -> Self {
        TaskError::FailedTask(value.to_string())
    }
}

impl ScriptTask {
    /// Creates a task that runs the given scripts for the given remote.
    pub fn new(url: String, scripts: Vec<String>) -> Self {
        ScriptTask { url, scripts }
    }

    fn run_script(&self, script: &str) -> Result<String, ScriptError> {
        // We can run `sh_dangerous`, because it is on the user's computer.
        let output = sh_dangerous(script)
            .env("GRM_TASK_NAME", TASK_NAME)
            .env("GRM_REMOTE_URL", &self.url)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;

        let output_str =
            std::str::from_utf8(&output.stdout).map_err(|_| ScriptError::NonUtf8Return)?;
        let output_str = output_str.trim_end().to_string();

        if output.status.success() {
            Ok(output_str)
        } else {
            Err(ScriptError::NonZeroExitcode(
                output.status.code().unwrap_or(-1),
                output_str,
            ))
        }
    }
}

impl Task for ScriptTask {
    /// Run every configured script for the remote, stopping on the first failure.
    fn run(&self) -> Result<(), TaskError> {
        for script in &self.scripts {
            debug!("Running script: {script} for remote {}.", self.url);

            match self.run_script(script) {
                Ok(result) => {
                    debug!("Script success, output:");
                    result.lines().for_each(|line| {
                        debug!("{line}");
                    });
                }
                Err(err) => {
                    error!("Failed: {err}.");
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_create_a_new_task() {
        let task = ScriptTask::new(String::from("a"), vec![String::from("echo test")]);

        assert_eq!("a", task.url);
        assert_eq!(vec!["echo test"], task.scripts);
    }

    #[test]
    fn it_should_run_the_script() -> Result<(), ScriptError> {
        let task = ScriptTask::new(String::from("a"), vec![]);

        let output = task.run_script("echo test")?;
        assert_eq!("test", output);

        Ok(())
    }

    #[test]
    fn it_should_set_the_env_vars() -> Result<(), ScriptError> {
        let task = ScriptTask::new(String::from("git@example.com:test.git"), vec![]);

        let output = task.run_script("printenv")?;
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines.contains(&"GRM_TASK_NAME=SCRIPT"));
        assert!(lines.contains(&"GRM_REMOTE_URL=git@example.com:test.git"));

        Ok(())
    }

    #[test]
    fn it_should_catch_error_output() -> Result<(), ScriptError> {
        let task = ScriptTask::new(String::from("a"), vec![]);

        let output = task.run_script("echo err >&2")?;
        assert_eq!("err", output);

        Ok(())
    }

    #[test]
    fn it_should_fail_if_the_script_fails() {
        let task = ScriptTask::new(String::from("a"), vec![]);

        let result = task.run_script("false");
        assert!(
            matches!(result, Err(ScriptError::NonZeroExitcode(1, _))),
            "{result:?} should match non zero exit code"
        );
    }

    #[test]
    fn it_should_fail_if_the_script_returns_non_utf8() {
        let task = ScriptTask::new(String::from("a"), vec![]);

        let result = task.run_script("/bin/echo -e '\\xc3\\x28'");
        assert!(
            matches!(result, Err(ScriptError::NonUtf8Return)),
            "{result:?} should match non utf8 return"
        );
    }

    #[test]
    fn it_should_stop_after_a_failing_script() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let task = ScriptTask::new(
            String::from("a"),
            vec![
                String::from("false"),
                format!("echo reached >> {}", out.display()),
            ],
        );

        let result = task.run();
        assert!(result.is_err());
        assert!(!out.exists());
    }
}
