use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

use crate::error::{parse_git_errors, GitError, SyncError};
use crate::models::{Organization, Repository};

/// Transport used to build remote URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteProtocol {
    /// Use SSH (git@github.com:org/repo.git)
    #[default]
    Ssh,
    /// Use HTTPS (https://github.com/org/repo.git)
    Https,
}

/// Where repositories are cloned from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub protocol: RemoteProtocol,

    #[serde(default = "default_git_host")]
    pub git_host: String,
}

fn default_git_host() -> String {
    "github.com".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            protocol: RemoteProtocol::default(),
            git_host: default_git_host(),
        }
    }
}

impl RemoteConfig {
    /// Remote URL for a repository of an organization
    pub fn url(&self, org: &Organization, repo: &Repository) -> String {
        match self.protocol {
            RemoteProtocol::Ssh => format!("git@{}:{}/{}.git", self.git_host, org.login, repo.name),
            RemoteProtocol::Https => {
                format!("https://{}/{}/{}.git", self.git_host, org.login, repo.name)
            }
        }
    }
}

/// Primitive operations delegated to an external git implementation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitOperations: Send + Sync {
    /// Clone `url` into `target`
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), GitError>;

    /// Whether the local repository has at least one branch head
    async fn has_branch_heads(&self, repo: &Path) -> Result<bool, GitError>;

    /// Fetch all remotes, pruning deleted refs
    async fn fetch(&self, repo: &Path) -> Result<(), GitError>;

    /// Pull all branches
    async fn pull(&self, repo: &Path) -> Result<(), GitError>;
}

/// `GitOperations` backed by the `git` binary on `PATH`
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, GitError> {
        let command = format!("git {}", args.join(" "));
        debug!("Running {}", command);

        let mut cmd = AsyncCommand::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(GitError::from_output(command, &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitOperations for GitCli {
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), GitError> {
        let target = target.to_string_lossy();
        self.run(&["clone", "--quiet", url, &*target], None).await?;
        Ok(())
    }

    async fn has_branch_heads(&self, repo: &Path) -> Result<bool, GitError> {
        let heads = self
            .run(
                &["for-each-ref", "--count=1", "--format=%(refname)", "refs/heads"],
                Some(repo),
            )
            .await?;

        Ok(!heads.trim().is_empty())
    }

    async fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        self.run(&["fetch", "--all", "--prune", "--quiet"], Some(repo))
            .await?;
        Ok(())
    }

    async fn pull(&self, repo: &Path) -> Result<(), GitError> {
        self.run(&["pull", "--all", "--quiet"], Some(repo)).await?;
        Ok(())
    }
}

/// What happened to a repository that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Repository was cloned
    Cloned,
    /// Existing clone was fetched and pulled
    Updated,
    /// Nothing to do for this repository
    Skipped { reason: String },
}

/// Clone and update policy on top of a `GitOperations` backend
pub struct GitClient<G: GitOperations> {
    git: Arc<G>,
    remote: RemoteConfig,
}

impl<G: GitOperations> GitClient<G> {
    pub fn new(git: Arc<G>, remote: RemoteConfig) -> Self {
        Self { git, remote }
    }

    /// Clone a repository into `target`
    pub async fn clone_repository(
        &self,
        org: &Organization,
        repo: &Repository,
        target: &Path,
    ) -> Result<SyncOutcome, SyncError> {
        info!("Clone repository to {}/{}", org.login, repo.name);

        let url = self.remote.url(org, repo);
        debug!("Using clone URL: {}", url);

        self.git
            .clone_repo(&url, target)
            .await
            .map_err(|e| SyncError::Clone {
                full_name: format!("{}/{}", org.login, repo.name),
                messages: parse_git_errors(&e),
            })?;

        Ok(SyncOutcome::Cloned)
    }

    /// Fetch and pull an existing clone at `target`
    ///
    /// A clone without any branch head is left alone: there is nothing to
    /// pull into and git would only report an error.
    pub async fn update_repository(
        &self,
        org: &Organization,
        repo: &Repository,
        target: &Path,
    ) -> Result<SyncOutcome, SyncError> {
        let update_error = |e: GitError| SyncError::Update {
            full_name: format!("{}/{}", org.login, repo.name),
            messages: parse_git_errors(&e),
        };

        if !self.git.has_branch_heads(target).await.map_err(update_error)? {
            info!(
                "Skip updating {}/{}: local repository has no branches",
                org.login, repo.name
            );
            return Ok(SyncOutcome::Skipped {
                reason: "local repository has no branches".to_string(),
            });
        }

        info!("Update repository in {}/{}", org.login, repo.name);

        self.git.fetch(target).await.map_err(update_error)?;
        self.git.pull(target).await.map_err(update_error)?;

        Ok(SyncOutcome::Updated)
    }
}
