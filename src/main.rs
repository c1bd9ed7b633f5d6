use anyhow::Result;
use clap::Parser;
use std::future::Future;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, warn};

use gstore::config::{self, Config};
use gstore::github::{orgs_from_patterns, parse_repo_pattern};
use gstore::logging::{self, LogSettings};
use gstore::{GitHubClient, Organization, SyncOptions};

#[cfg(unix)]
const INTERRUPTED: u8 = 128 + nix::sys::signal::Signal::SIGINT as u8;
#[cfg(not(unix))]
const INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "gstore")]
#[command(about = "Synchronize GitHub repositories of your organizations")]
#[command(version)]
struct Cli {
    /// Base directory for repositories (defaults to the current directory)
    #[arg(value_name = "TARGET")]
    target: Option<String>,

    /// GitHub token (read from GH_TOKEN, GITHUB_TOKEN, GH_ENTERPRISE_TOKEN or
    /// GITHUB_ENTERPRISE_TOKEN when omitted)
    #[arg(long)]
    token: Option<String>,

    /// GitHub API host (read from GH_HOST when omitted)
    #[arg(long)]
    host: Option<String>,

    /// Organization to sync, may be repeated (all of yours when omitted)
    #[arg(long = "org", value_name = "ORG")]
    orgs: Vec<String>,

    /// Repository to sync as ORG:REPO, may be repeated
    #[arg(long = "repo", value_name = "ORG:REPO")]
    repos: Vec<String>,

    /// Number of parallel workers (CPU count when omitted)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        },
        () = interrupted(tokio::signal::ctrl_c()) => {
            warn!("Interrupted, stopping");
            ExitCode::from(INTERRUPTED)
        }
    }
}

/// Resolves once `signal` reports an interrupt; never if it cannot listen
async fn interrupted<F: Future<Output = io::Result<()>>>(signal: F) {
    if let Err(e) = signal.await {
        warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Log a fatal error, falling back to stderr if no logger is installed yet
fn report(err: &anyhow::Error) {
    if tracing::dispatcher::has_been_set() {
        error!("{:#}", err);
    } else {
        eprintln!("Error: {:#}", err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    let log = LogSettings {
        verbose: cli.verbose,
        quiet: cli.quiet,
        color: config.logging.color && std::io::stdout().is_terminal(),
    };
    logging::init(&log)?;

    debug!("Starting gstore v{}", env!("CARGO_PKG_VERSION"));

    let token = cli
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(config::lookup_token)
        .unwrap_or_default();
    let host = config.host(cli.host.as_deref());
    let client = GitHubClient::new(&token, host.as_deref())?;

    let target = config.target(cli.target.as_deref())?;
    let org_names = prefer_cli(cli.orgs, &config.github.organizations);
    let patterns = prefer_cli(cli.repos, &config.github.repositories);

    let orgs = if !org_names.is_empty() {
        client.resolve_orgs(&org_names).await?
    } else if !patterns.is_empty() {
        client.resolve_orgs(&orgs_from_patterns(&patterns)).await?
    } else {
        client.get_organizations().await?
    };

    let options = SyncOptions {
        verbose: log.verbose,
        quiet: log.quiet,
        color: log.color,
        jobs: config.jobs(cli.jobs),
        remote: config.remote(),
    };

    for org in &orgs {
        let repos = if names_org(&patterns, org) {
            client.resolve_repos(&patterns, org).await?
        } else {
            client.get_repositories(org).await?
        };

        gstore::sync(org, &repos, &target, &options).await?;
    }

    Ok(())
}

fn prefer_cli(cli: Vec<String>, file: &[String]) -> Vec<String> {
    if cli.is_empty() {
        file.to_vec()
    } else {
        cli
    }
}

/// Whether any pattern selects repositories of `org`
fn names_org(patterns: &[String], org: &Organization) -> bool {
    patterns
        .iter()
        .filter_map(|p| parse_repo_pattern(p))
        .any(|(owner, _)| org.matches(owner))
}
