//! Package-manager operations: building and running pip invocations.

mod registry;

pub use registry::{
    InstalledIndex, PackageInfo, PipIndex, canonical_name, import_name, info, is_installed,
};

#[cfg(test)]
pub use registry::MockInstalledIndex;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

use crate::runner::RunCommand;

/// Default package-manager program.
pub const DEFAULT_PIP: &str = "pip";

/// Outcome of one install (or self-update) attempt.
///
/// Failures are part of the outcome, never an `Err`: a broken install must
/// not tear down the interactive session that asked for it.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Human-readable one-line summary.
    pub message: String,
}

/// Builds the pip argument vector for installing the given packages.
pub fn install_command<I, S>(packages: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = vec!["install".to_string()];
    args.extend(packages.into_iter().map(|p| p.as_ref().to_string()));
    args
}

/// pip operations over an injected subprocess runner.
pub struct Pip<R: RunCommand> {
    runner: R,
    program: String,
}

impl<R: RunCommand> Pip<R> {
    pub fn new(runner: R, program: Option<String>) -> Self {
        let program = program.unwrap_or_else(|| DEFAULT_PIP.to_string());
        Self { runner, program }
    }

    /// Installs one or more packages in a single pip invocation.
    ///
    /// With `show_output` the captured stdio is echoed to the console.
    /// Every failure mode (non-zero exit, spawn error) is folded into the
    /// returned outcome.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, packages: &[String], show_output: bool) -> InstallOutcome {
        let label = packages.join(", ");
        let args = install_command(packages);

        match self.runner.run(&self.program, &args).await {
            Ok(output) => {
                if show_output {
                    if !output.stdout.is_empty() {
                        println!("{}", output.stdout);
                    }
                    if !output.stderr.is_empty() {
                        eprintln!("{}", output.stderr);
                    }
                }

                let message = if output.success {
                    format!("{} has been installed successfully.", label)
                } else {
                    format!(
                        "Failed to install {}.\nError output:\n{}",
                        label, output.stderr
                    )
                };

                InstallOutcome {
                    success: output.success,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    message,
                }
            }
            Err(e) => {
                warn!("Could not invoke {} for {}: {:#}", self.program, label, e);
                InstallOutcome {
                    success: false,
                    stdout: String::new(),
                    stderr: String::new(),
                    message: format!("Failed to install {}. Error: {:#}", label, e),
                }
            }
        }
    }

    /// Installs each package in its own pip invocation, driving a progress
    /// bar sized to the package count. Console side effects only.
    #[tracing::instrument(skip(self))]
    pub async fn install_many(&self, packages: &[String]) {
        let bar = ProgressBar::new(packages.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Installing packages");

        for package in packages {
            let outcome = self.install(std::slice::from_ref(package), false).await;
            bar.println(&outcome.message);
            bar.inc(1);
        }

        bar.finish_and_clear();
    }

    /// The installed version of pip itself.
    ///
    /// Parsed from `pip --version` output ("pip 24.0 from ... (python 3.12)").
    #[tracing::instrument(skip(self))]
    pub async fn version(&self) -> Result<String> {
        let output = self
            .runner
            .run(&self.program, &["--version".to_string()])
            .await?;

        if !output.success {
            return Err(anyhow!(
                "{} --version exited with {:?}: {}",
                self.program,
                output.status,
                output.stderr.trim()
            ));
        }

        output
            .stdout
            .split_whitespace()
            .nth(1)
            .map(str::to_string)
            .with_context(|| format!("Unexpected {} --version output", self.program))
    }

    /// Upgrades pip itself, with the same report discipline as `install`.
    #[tracing::instrument(skip(self))]
    pub async fn self_update(&self) -> InstallOutcome {
        let args = vec![
            "install".to_string(),
            "--upgrade".to_string(),
            "pip".to_string(),
        ];

        match self.runner.run(&self.program, &args).await {
            Ok(output) => {
                let message = if output.success {
                    "pip has been updated to the latest version successfully.".to_string()
                } else {
                    format!(
                        "Failed to update pip.\nError output:\n{}",
                        output.stderr
                    )
                };

                InstallOutcome {
                    success: output.success,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    message,
                }
            }
            Err(e) => {
                warn!("Could not invoke {} to update pip: {:#}", self.program, e);
                InstallOutcome {
                    success: false,
                    stdout: String::new(),
                    stderr: String::new(),
                    message: format!("Failed to update pip. Error: {:#}", e),
                }
            }
        }
    }
}
