//! Subprocess execution behind a mockable trait.
//!
//! Everything that shells out (pip invocations, the import probe) goes
//! through [`RunCommand`] so tests can substitute captured outputs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default ceiling for a single subprocess run. Package installs can be
/// slow, but a hung pip must not hang the caller forever.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, if the process terminated normally.
    pub status: Option<i32>,
    /// True when the process exited with status zero.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunCommand: Send + Sync {
    /// Runs `program` with `args`, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error; it is reported through
    /// [`CommandOutput::success`]. `Err` means the process could not be
    /// spawned or did not finish within the timeout.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runs real subprocesses via tokio with a hard timeout.
pub struct RealRunner {
    timeout: Duration,
}

impl RealRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RealRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl RunCommand for RealRunner {
    #[tracing::instrument(skip(self))]
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running {} {:?}...", program, args);

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .with_context(|| {
            format!(
                "{} did not finish within {} seconds",
                program,
                self.timeout.as_secs()
            )
        })?
        .with_context(|| format!("Failed to run {}", program))?;

        Ok(CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
