use octocrab::Octocrab;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::ClientError;
use crate::models::{Organization, Repository};

/// Default GitHub API host
pub const DEFAULT_HOST: &str = "api.github.com";

/// Connect and read timeout of every API request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

type Result<T> = std::result::Result<T, ClientError>;

/// GitHub API client wrapper
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client for `host` (defaults to api.github.com).
    ///
    /// No request is made here; a bad token surfaces on first use as
    /// `ClientError::InvalidCredentials`.
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        Self::with_timeout(token, host, DEFAULT_TIMEOUT)
    }

    /// Like `new`, giving up on a request after `timeout` without progress
    pub fn with_timeout(token: &str, host: Option<&str>, timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }

        let host = host.filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);
        let base_uri = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        debug!("Using GitHub API at {}", base_uri);

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_uri.as_str())
            .map_err(|_| ClientError::InvalidHost(host.to_string()))?
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .add_header(http::header::USER_AGENT, user_agent())
            .build()?;

        Ok(Self { client })
    }

    /// All organizations the authenticated user belongs to
    pub async fn get_organizations(&self) -> Result<Vec<Organization>> {
        info!("Getting organizations for user");

        let first = self
            .client
            .current()
            .list_org_memberships_for_authenticated_user()
            .per_page(100)
            .send()
            .await
            .map_err(map_error)?;

        let memberships = self.client.all_pages(first).await.map_err(map_error)?;

        // Pending invitations are listed too
        let orgs: Vec<Organization> = memberships
            .into_iter()
            .filter(|m| m.state == "active")
            .map(|m| Organization::new(m.organization.login))
            .collect();

        info!("Total number of organizations: {}", orgs.len());
        Ok(orgs)
    }

    /// All repositories of an organization, sorted by name
    pub async fn get_repositories(&self, org: &Organization) -> Result<Vec<Repository>> {
        info!("Getting repositories for {} organization", org.login);

        let first = self
            .client
            .orgs(org.login.as_str())
            .list_repos()
            .per_page(100)
            .send()
            .await
            .map_err(map_error)?;

        let items = self.client.all_pages(first).await.map_err(map_error)?;

        let shared = Arc::new(org.clone());
        let mut repos: Vec<Repository> = items
            .into_iter()
            .map(|r| Repository::new(r.name, Arc::clone(&shared)))
            .collect();
        repos.sort_by_key(|r| r.name.to_lowercase());

        info!(
            "Total number of repositories for {}: {}",
            org.login,
            repos.len()
        );
        Ok(repos)
    }

    /// Resolve organization names; unknown names are logged and skipped
    pub async fn resolve_orgs(&self, names: &[String]) -> Result<Vec<Organization>> {
        info!("Resolve organizations from provided configuration");

        let mut orgs = Vec::new();

        for name in names {
            match self.client.orgs(name.as_str()).get().await {
                Ok(org) => orgs.push(Organization::new(org.login)),
                Err(e) if is_not_found(&e) => {
                    warn!("Organization {} not found, skip resolving", name);
                }
                Err(e) => return Err(map_error(e)),
            }
        }

        Ok(orgs)
    }

    /// Resolve `org:repo` patterns that belong to `org`
    pub async fn resolve_repos(
        &self,
        patterns: &[String],
        org: &Organization,
    ) -> Result<Vec<Repository>> {
        info!("Resolve repositories from provided configuration");

        let shared = Arc::new(org.clone());
        let mut repos = Vec::new();

        for pattern in patterns {
            let Some((owner, name)) = parse_repo_pattern(pattern) else {
                error!("Invalid repo pattern: \"{}\", skip resolving", pattern);
                continue;
            };

            if !org.matches(owner) {
                continue;
            }

            match self.client.repos(org.login.as_str(), name).get().await {
                Ok(repo) => repos.push(Repository::new(repo.name, Arc::clone(&shared))),
                Err(e) if is_not_found(&e) => {
                    warn!("Repository {}/{} not found, skip resolving", org.login, name);
                }
                Err(e) => return Err(map_error(e)),
            }
        }

        Ok(repos)
    }
}

/// `User-Agent` sent with every request
pub fn user_agent() -> String {
    format!("gstore/{}", env!("CARGO_PKG_VERSION"))
}

/// Split an `org:repo` pattern into its two non-empty parts
pub fn parse_repo_pattern(pattern: &str) -> Option<(&str, &str)> {
    let mut parts = pattern.split(':');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some((owner, name))
        }
        _ => None,
    }
}

/// Organization names referenced by valid patterns, deduplicated ignoring case
pub fn orgs_from_patterns(patterns: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for (owner, _) in patterns.iter().filter_map(|p| parse_repo_pattern(p)) {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(owner)) {
            names.push(owner.to_string());
        }
    }

    names
}

fn status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    status_code(err) == Some(404)
}

fn map_error(err: octocrab::Error) -> ClientError {
    if status_code(&err) == Some(401) {
        ClientError::InvalidCredentials
    } else {
        ClientError::Api(err)
    }
}
