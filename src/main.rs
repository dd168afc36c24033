use anyhow::{Context, Result};
use clap::Parser;
use pipmate::index::PyPi;
use pipmate::pip::PipIndex;
use pipmate::runner::RealRunner;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// pipmate - pip and PyPI helpers for interactive Python sessions
///
/// Queries the package index for release versions and wraps pip for
/// installing and inspecting packages.
///
/// Examples:
///   pipmate latest requests      # latest stable version on PyPI
///   pipmate install rich httpx   # install packages with a progress bar
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Package index URL (defaults to https://pypi.org)
    #[arg(long = "index-url", env = "PIPMATE_INDEX_URL", value_name = "URL", global = true)]
    pub index_url: Option<String>,

    /// pip program to invoke (defaults to "pip")
    #[arg(long = "pip", env = "PIPMATE_PIP", value_name = "PROGRAM", global = true)]
    pub pip: Option<String>,

    /// Python interpreter for import probes (defaults to "python3")
    #[arg(long = "python", env = "PIPMATE_PYTHON", value_name = "PROGRAM", global = true)]
    pub python: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List all release versions of a package, oldest first
    Versions(PackageArgs),

    /// Show the latest stable version of a package
    Latest(PackageArgs),

    /// Install one or more packages with pip
    Install(InstallArgs),

    /// Show installed version, location and importability of a package
    Info(PackageArgs),

    /// Show the installed pip version
    PipVersion,

    /// Upgrade pip itself
    UpdatePip,
}

#[derive(clap::Args, Debug)]
struct PackageArgs {
    /// The package name
    #[arg(value_name = "PACKAGE")]
    package: String,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    /// The package names
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<String>,

    /// Suppress pip's own output
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runner = RealRunner::default();

    match cli.command {
        Commands::Versions(args) => {
            pipmate::commands::versions(pypi_client(cli.index_url)?, &args.package).await?
        }
        Commands::Latest(args) => {
            pipmate::commands::latest(pypi_client(cli.index_url)?, &args.package).await?
        }
        Commands::Install(args) => {
            pipmate::commands::install(runner, cli.pip, &args.packages, args.quiet).await?
        }
        Commands::Info(args) => {
            let index = PipIndex::new(runner, cli.pip, cli.python);
            pipmate::commands::info(index, &args.package).await?
        }
        Commands::PipVersion => pipmate::commands::pip_version(runner, cli.pip).await?,
        Commands::UpdatePip => pipmate::commands::update_pip(runner, cli.pip).await?,
    }
    Ok(())
}

fn pypi_client(index_url: Option<String>) -> Result<PyPi> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    Ok(PyPi::new(client, index_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_versions_parsing() {
        let cli = Cli::try_parse_from(["pipmate", "versions", "requests"]).unwrap();
        match cli.command {
            Commands::Versions(args) => assert_eq!(args.package, "requests"),
            _ => panic!("Expected Versions command"),
        }
        assert_eq!(cli.index_url, None);
    }

    #[test]
    fn test_cli_install_parsing_multiple_packages() {
        let cli = Cli::try_parse_from(["pipmate", "install", "foo", "bar"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.packages, vec!["foo", "bar"]);
                assert!(!args.quiet);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_install_quiet_flag() {
        let cli = Cli::try_parse_from(["pipmate", "install", "--quiet", "foo"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert!(args.quiet),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_install_requires_a_package() {
        assert!(Cli::try_parse_from(["pipmate", "install"]).is_err());
    }

    #[test]
    fn test_cli_global_index_url() {
        let cli =
            Cli::try_parse_from(["pipmate", "latest", "requests", "--index-url", "http://localhost"])
                .unwrap();
        assert_eq!(cli.index_url, Some("http://localhost".to_string()));
    }

    #[test]
    fn test_cli_global_pip_program() {
        let cli = Cli::try_parse_from(["pipmate", "--pip", "pip3", "update-pip"]).unwrap();
        assert_eq!(cli.pip, Some("pip3".to_string()));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["pipmate"]).is_err());
    }
}
