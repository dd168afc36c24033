//! Thin application actions behind the CLI.
//!
//! Each function composes the library facades and prints the result; the
//! facades own the degrade-on-failure behavior, so these never fail for
//! environmental reasons.

use anyhow::Result;

use crate::index::{QueryIndex, VersionQuery};
use crate::pip::{self, InstalledIndex, Pip};
use crate::runner::RunCommand;

/// Print every known release of a package, one per line, oldest first.
#[tracing::instrument(skip(index))]
pub async fn versions<Q: QueryIndex>(index: Q, package: &str) -> Result<()> {
    let query = VersionQuery::new(index);
    for version in query.list_versions(package).await {
        println!("{}", version);
    }
    Ok(())
}

/// Print the latest stable release of a package.
#[tracing::instrument(skip(index))]
pub async fn latest<Q: QueryIndex>(index: Q, package: &str) -> Result<()> {
    let query = VersionQuery::new(index);
    match query.latest_stable(package).await {
        Some(version) => println!("{}", version),
        None => println!("No stable versions found for {}.", package),
    }
    Ok(())
}

/// Install packages. A single package runs as one echoed pip invocation;
/// multiple packages install one by one behind a progress bar.
#[tracing::instrument(skip(runner))]
pub async fn install<R: RunCommand>(
    runner: R,
    pip_program: Option<String>,
    packages: &[String],
    quiet: bool,
) -> Result<()> {
    let pip = Pip::new(runner, pip_program);

    if packages.len() == 1 {
        let outcome = pip.install(packages, !quiet).await;
        println!("{}", outcome.message);
    } else {
        pip.install_many(packages).await;
    }
    Ok(())
}

/// Print installed metadata and importability for a package.
#[tracing::instrument(skip(index))]
pub async fn info<I: InstalledIndex>(index: I, package: &str) -> Result<()> {
    match pip::info(&index, package).await {
        Some(details) => {
            println!("Name: {}", package);
            println!("Version: {}", details.version);
            println!("Location: {}", details.location.display());
            println!("Importable: {}", if details.can_import { "yes" } else { "no" });
        }
        None => println!("{} is not installed.", package),
    }
    Ok(())
}

/// Print the package manager's own version.
#[tracing::instrument(skip(runner))]
pub async fn pip_version<R: RunCommand>(runner: R, pip_program: Option<String>) -> Result<()> {
    let pip = Pip::new(runner, pip_program);
    println!("{}", pip.version().await?);
    Ok(())
}

/// Upgrade the package manager itself.
#[tracing::instrument(skip(runner))]
pub async fn update_pip<R: RunCommand>(runner: R, pip_program: Option<String>) -> Result<()> {
    let pip = Pip::new(runner, pip_program);
    let outcome = pip.self_update().await;
    println!("{}", outcome.message);
    Ok(())
}
