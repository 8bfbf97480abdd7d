use mockall::automock;
use thiserror::Error;

/// A discovery that runs an external command listing the remotes.
pub mod command;

/// A custom error for describing the error cases for discoveries
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Cannot initialize discovery, because the command line cannot be parsed.
    #[error("the remotes command cannot be parsed: {0}")]
    Misconfigured(String),
    /// The underlying Rust command creation failed. The parameter contains the error.
    #[error("the remotes command cannot run: {0}")]
    CommandFailure(#[from] std::io::Error),
    /// The command returned a non-zero exit code, or was killed after the
    /// configured timeout. The parameters are the exit code and the captured output.
    #[error("the remotes command returned non-zero exit code {0} with output: {1}")]
    CommandFailed(i32, String),
    /// The command output contains non-UTF8 characters.
    #[error("the remotes command returned invalid characters")]
    NonUtf8Output,
}

/// A discovery lists the remote repositories that should be monitored.
///
/// Discoveries may include:
///   - running an external command ([command::CommandDiscovery])
///   - etc.
#[automock]
pub trait Discovery {
    /// List the remotes to monitor, in the order they should be dispatched.
    fn discover(&self) -> Result<Vec<String>, DiscoveryError>;
}
