//! Queryable view of the host's installed-distribution state.
//!
//! The interpreter's package registry is ambient global state; it is kept
//! behind [`InstalledIndex`] so the facade functions can be exercised
//! against a mock instead of a live Python environment.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::runner::RunCommand;

/// Default interpreter used for the import probe.
pub const DEFAULT_PYTHON: &str = "python3";

/// Metadata of one installed distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    pub version: String,
    /// Install location (site-packages directory).
    pub location: PathBuf,
    /// Whether the package's top-level module imports cleanly. Installed
    /// metadata and importability can diverge, so this is probed
    /// separately.
    pub can_import: bool,
}

/// One entry of `pip list --format=json`.
#[derive(Debug, Deserialize)]
struct ListedDistribution {
    name: String,
    #[allow(dead_code)]
    version: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstalledIndex: Send + Sync {
    /// Canonical names of every installed distribution.
    async fn installed(&self) -> Result<BTreeSet<String>>;

    /// Version and location of one distribution, `None` when it is not
    /// registered as installed.
    async fn distribution(&self, package: &str) -> Result<Option<(String, PathBuf)>>;

    /// Attempts to import `module` in the host interpreter.
    async fn probe_import(&self, module: &str) -> bool;
}

/// Real registry backed by pip and the host interpreter.
pub struct PipIndex<R: RunCommand> {
    runner: R,
    pip: String,
    python: String,
}

impl<R: RunCommand> PipIndex<R> {
    pub fn new(runner: R, pip: Option<String>, python: Option<String>) -> Self {
        Self {
            runner,
            pip: pip.unwrap_or_else(|| super::DEFAULT_PIP.to_string()),
            python: python.unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
        }
    }
}

#[async_trait]
impl<R: RunCommand> InstalledIndex for PipIndex<R> {
    #[tracing::instrument(skip(self))]
    async fn installed(&self) -> Result<BTreeSet<String>> {
        let args = vec![
            "list".to_string(),
            "--format=json".to_string(),
            "--disable-pip-version-check".to_string(),
        ];
        let output = self.runner.run(&self.pip, &args).await?;

        if !output.success {
            return Err(anyhow!(
                "{} list exited with {:?}: {}",
                self.pip,
                output.status,
                output.stderr.trim()
            ));
        }

        let listed: Vec<ListedDistribution> = serde_json::from_str(&output.stdout)
            .context("Failed to parse pip list output as JSON")?;

        Ok(listed
            .into_iter()
            .map(|d| canonical_name(&d.name))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn distribution(&self, package: &str) -> Result<Option<(String, PathBuf)>> {
        let args = vec![
            "show".to_string(),
            "--disable-pip-version-check".to_string(),
            package.to_string(),
        ];
        let output = self.runner.run(&self.pip, &args).await?;

        // pip show exits non-zero when the package is unknown.
        if !output.success {
            debug!("{} show found no distribution for {}", self.pip, package);
            return Ok(None);
        }

        let mut version = None;
        let mut location = None;
        for line in output.stdout.lines() {
            if let Some(v) = line.strip_prefix("Version:") {
                version = Some(v.trim().to_string());
            } else if let Some(l) = line.strip_prefix("Location:") {
                location = Some(PathBuf::from(l.trim()));
            }
        }

        match (version, location) {
            (Some(version), Some(location)) => Ok(Some((version, location))),
            _ => Err(anyhow!(
                "{} show output for {} is missing Version or Location",
                self.pip,
                package
            )),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn probe_import(&self, module: &str) -> bool {
        let args = vec!["-c".to_string(), format!("import {}", module)];
        match self.runner.run(&self.python, &args).await {
            Ok(output) => output.success,
            Err(e) => {
                warn!("Import probe for {} could not run: {:#}", module, e);
                false
            }
        }
    }
}

/// PEP 503 canonical form of a package name: lowercase, with runs of
/// `-`, `_` and `.` collapsed to a single `-`.
pub fn canonical_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut previous_was_separator = false;

    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !previous_was_separator {
                canonical.push('-');
            }
            previous_was_separator = true;
        } else {
            canonical.extend(c.to_lowercase());
            previous_was_separator = false;
        }
    }

    canonical
}

/// Best-effort module name for the import probe: distribution names use
/// `-` where module names use `_`.
pub fn import_name(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}

/// Whether `package` is registered as installed. Case-insensitive; errors
/// degrade to `false` after a logged warning.
#[tracing::instrument(skip(index))]
pub async fn is_installed<I: InstalledIndex>(index: &I, package: &str) -> bool {
    match index.installed().await {
        Ok(installed) => installed.contains(&canonical_name(package)),
        Err(e) => {
            warn!("Failed to list installed packages: {:#}", e);
            false
        }
    }
}

/// Installed metadata for `package`, with an import-capability probe.
/// `None` (logged) when the package is not registered as installed.
#[tracing::instrument(skip(index))]
pub async fn info<I: InstalledIndex>(index: &I, package: &str) -> Option<PackageInfo> {
    match index.distribution(package).await {
        Ok(Some((version, location))) => {
            let can_import = index.probe_import(&import_name(package)).await;
            Some(PackageInfo {
                version,
                location,
                can_import,
            })
        }
        Ok(None) => {
            warn!("{} is not installed.", package);
            None
        }
        Err(e) => {
            warn!("Failed to look up {}: {:#}", package, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, MockRunCommand};
    use mockall::predicate::eq;

    #[test]
    fn test_canonical_name_lowercases() {
        assert_eq!(canonical_name("Foo"), "foo");
        assert_eq!(canonical_name("FOO"), "foo");
    }

    #[test]
    fn test_canonical_name_folds_separators() {
        assert_eq!(canonical_name("typing_extensions"), "typing-extensions");
        assert_eq!(canonical_name("ruamel.yaml"), "ruamel-yaml");
        assert_eq!(canonical_name("a--b__c"), "a-b-c");
    }

    #[test]
    fn test_import_name() {
        assert_eq!(import_name("typing-extensions"), "typing_extensions");
        assert_eq!(import_name("Requests"), "requests");
    }

    fn pip_list_output() -> CommandOutput {
        CommandOutput {
            status: Some(0),
            success: true,
            stdout: r#"[{"name": "Requests", "version": "2.32.0"}, {"name": "typing_extensions", "version": "4.12.0"}]"#
                .to_string(),
            stderr: String::new(),
        }
    }

    #[tokio::test]
    async fn test_installed_canonicalizes_names() {
        let mut runner = MockRunCommand::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(pip_list_output()));

        let index = PipIndex::new(runner, None, None);
        let installed = index.installed().await.unwrap();

        assert!(installed.contains("requests"));
        assert!(installed.contains("typing-extensions"));
    }

    #[tokio::test]
    async fn test_is_installed_case_insensitive() {
        let mut runner = MockRunCommand::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(pip_list_output()));

        let index = PipIndex::new(runner, None, None);
        assert!(is_installed(&index, "Requests").await);
        assert!(is_installed(&index, "requests").await);
        assert!(!is_installed(&index, "flask").await);
    }

    #[tokio::test]
    async fn test_is_installed_degrades_to_false_on_error() {
        let mut index = MockInstalledIndex::new();
        index
            .expect_installed()
            .returning(|| Err(anyhow!("pip missing")));

        assert!(!is_installed(&index, "requests").await);
    }

    #[tokio::test]
    async fn test_distribution_parses_pip_show() {
        let mut runner = MockRunCommand::new();
        runner.expect_run().returning(|_, _| {
            Ok(CommandOutput {
                status: Some(0),
                success: true,
                stdout: "Name: requests\nVersion: 2.32.0\nLocation: /usr/lib/python3/site-packages\n"
                    .to_string(),
                stderr: String::new(),
            })
        });

        let index = PipIndex::new(runner, None, None);
        let (version, location) = index.distribution("requests").await.unwrap().unwrap();

        assert_eq!(version, "2.32.0");
        assert_eq!(location, PathBuf::from("/usr/lib/python3/site-packages"));
    }

    #[tokio::test]
    async fn test_distribution_not_installed() {
        let mut runner = MockRunCommand::new();
        runner.expect_run().returning(|_, _| {
            Ok(CommandOutput {
                status: Some(1),
                success: false,
                stdout: String::new(),
                stderr: "WARNING: Package(s) not found: nope\n".to_string(),
            })
        });

        let index = PipIndex::new(runner, None, None);
        assert!(index.distribution("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_probe_import_uses_interpreter() {
        let mut runner = MockRunCommand::new();
        runner
            .expect_run()
            .with(
                eq("python3"),
                eq(vec!["-c".to_string(), "import requests".to_string()]),
            )
            .returning(|_, _| {
                Ok(CommandOutput {
                    status: Some(0),
                    success: true,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            });

        let index = PipIndex::new(runner, None, None);
        assert!(index.probe_import("requests").await);
    }

    #[tokio::test]
    async fn test_info_combines_distribution_and_probe() {
        let mut index = MockInstalledIndex::new();
        index.expect_distribution().returning(|_| {
            Ok(Some((
                "4.12.0".to_string(),
                PathBuf::from("/site-packages"),
            )))
        });
        index
            .expect_probe_import()
            .with(eq("typing_extensions"))
            .returning(|_| false);

        let info = info(&index, "typing-extensions").await.unwrap();
        assert_eq!(info.version, "4.12.0");
        assert_eq!(info.location, PathBuf::from("/site-packages"));
        assert!(!info.can_import);
    }

    #[tokio::test]
    async fn test_info_none_when_not_installed() {
        let mut index = MockInstalledIndex::new();
        index.expect_distribution().returning(|_| Ok(None));

        assert!(info(&index, "nope").await.is_none());
    }

    #[tokio::test]
    async fn test_info_none_on_error() {
        let mut index = MockInstalledIndex::new();
        index
            .expect_distribution()
            .returning(|_| Err(anyhow!("pip broke")));

        assert!(info(&index, "nope").await.is_none());
    }
}
