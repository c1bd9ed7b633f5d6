//! Sync Engine - fans repositories out across parallel workers
//!
//! The repository list is cut into contiguous chunks, one per worker. Each
//! worker builds its own context (logger, base path) before touching its
//! first repository and then walks its chunk in order: inspect the target
//! path, plan an action, run git. A failure is terminal for that repository
//! only; it is logged and the worker moves on. Nothing but the log stream
//! reports per-repository results.

use crate::error::SyncError;
use crate::git::{GitCli, GitClient, GitOperations, RemoteConfig, SyncOutcome};
use crate::inspect::inspect;
use crate::logging::{default_factory, DispatchFactory, LogSettings};
use crate::models::{Organization, Repository};
use crate::path::normalize;
use crate::plan::{plan, Blocked, SyncAction};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, info_span, warn, Dispatch, Instrument};

/// Options for one `sync` invocation
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub color: bool,
    /// Requested worker count; `None` uses the available parallelism
    pub jobs: Option<usize>,
    pub remote: RemoteConfig,
}

impl SyncOptions {
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            verbose: self.verbose,
            quiet: self.quiet,
            color: self.color,
        }
    }
}

/// Number of workers for `repo_count` repositories
pub fn worker_count(repo_count: usize, requested: Option<usize>) -> usize {
    let limit = requested
        .filter(|&jobs| jobs > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

    repo_count.min(limit)
}

/// Split `items` into `jobs` contiguous chunks whose sizes differ by at most one
pub fn partition<T>(items: &[T], jobs: usize) -> Vec<&[T]> {
    if items.is_empty() || jobs == 0 {
        return Vec::new();
    }

    let jobs = jobs.min(items.len());
    let base = items.len() / jobs;
    let extra = items.len() % jobs;

    let mut chunks = Vec::with_capacity(jobs);
    let mut start = 0;
    for index in 0..jobs {
        let len = base + usize::from(index < extra);
        chunks.push(&items[start..start + len]);
        start += len;
    }

    chunks
}

/// Worker-local execution context, built once when the worker starts
pub struct WorkerContext {
    pub id: usize,
    pub base_path: PathBuf,
    dispatch: Dispatch,
}

impl WorkerContext {
    /// Build the worker's own logger from `options` and bind it to `base_path`
    pub fn init(
        id: usize,
        base_path: &Path,
        options: &SyncOptions,
        make_dispatch: &DispatchFactory,
    ) -> Self {
        Self {
            id,
            base_path: base_path.to_path_buf(),
            dispatch: make_dispatch(&options.log_settings()),
        }
    }

    /// `base_path/org/repo`
    pub fn target(&self, org: &Organization, repo: &Repository) -> PathBuf {
        self.base_path.join(&org.login).join(&repo.name)
    }
}

/// Per-worker tally, reported once the chunk is done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub cloned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl WorkerSummary {
    fn record(&mut self, result: &std::result::Result<SyncOutcome, SyncError>) {
        match result {
            Ok(SyncOutcome::Cloned) => self.cloned += 1,
            Ok(SyncOutcome::Updated) => self.updated += 1,
            Ok(SyncOutcome::Skipped { .. }) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// The dispatcher that synchronizes one organization's repositories
pub struct SyncEngine<G: GitOperations> {
    git: Arc<G>,
    make_dispatch: DispatchFactory,
}

impl<G: GitOperations + 'static> SyncEngine<G> {
    pub fn new(git: G) -> Self {
        Self::from_shared(Arc::new(git))
    }

    /// Create from a backend the caller keeps a handle to
    pub fn from_shared(git: Arc<G>) -> Self {
        Self {
            git,
            make_dispatch: default_factory(),
        }
    }

    /// Replace how each worker builds its logger
    pub fn with_dispatch_factory(mut self, make_dispatch: DispatchFactory) -> Self {
        self.make_dispatch = make_dispatch;
        self
    }

    /// Clone or update every repository of `org` under `base_path`.
    ///
    /// Only a failure to create the organization directory or a crashed
    /// worker is returned as an error.
    pub async fn sync(
        &self,
        org: &Organization,
        repos: &[Repository],
        base_path: &str,
        options: &SyncOptions,
    ) -> Result<()> {
        if repos.is_empty() {
            warn!("No repositories to sync for {}", org.login);
            return Ok(());
        }

        info!("Sync repos for {}", org.login);

        let base_path = PathBuf::from(normalize(base_path));
        let org_path = base_path.join(&org.login);

        if !org_path.exists() {
            tokio::fs::create_dir_all(&org_path)
                .await
                .with_context(|| format!("Failed to create directory: {}", org_path.display()))?;
            debug!("Created directory {}", org_path.display());
        }

        let jobs = worker_count(repos.len(), options.jobs);
        debug!(
            "Syncing {} repositories with {} workers",
            repos.len(),
            jobs
        );

        let client = Arc::new(GitClient::new(
            Arc::clone(&self.git),
            options.remote.clone(),
        ));
        let org = Arc::new(org.clone());

        let mut workers = JoinSet::new();

        for (id, chunk) in partition(repos, jobs).into_iter().enumerate() {
            let chunk = chunk.to_vec();
            let client = Arc::clone(&client);
            let org = Arc::clone(&org);
            let base_path = base_path.clone();
            let options = options.clone();
            let make_dispatch = Arc::clone(&self.make_dispatch);

            workers.spawn(async move {
                let ctx = WorkerContext::init(id, &base_path, &options, &make_dispatch);
                let dispatch = ctx.dispatch.clone();

                run_worker(ctx, client, org, chunk)
                    .with_subscriber(dispatch)
                    .await
            });
        }

        while let Some(joined) = workers.join_next().await {
            joined.context("Sync worker failed")?;
        }

        Ok(())
    }
}

/// Synchronize with the `git` binary found on `PATH`
pub async fn sync(
    org: &Organization,
    repos: &[Repository],
    base_path: &str,
    options: &SyncOptions,
) -> Result<()> {
    SyncEngine::new(GitCli::new())
        .sync(org, repos, base_path, options)
        .await
}

async fn run_worker<G: GitOperations>(
    ctx: WorkerContext,
    client: Arc<GitClient<G>>,
    org: Arc<Organization>,
    repos: Vec<Repository>,
) -> WorkerSummary {
    let span = info_span!("worker", id = ctx.id);

    async move {
        debug!("Worker started with {} repositories", repos.len());

        let mut summary = WorkerSummary::default();

        for repo in &repos {
            let result = sync_repository(&ctx, &client, &org, repo).await;

            if let Err(e) = &result {
                error!("{}", e);
                for message in e.messages() {
                    error!("{}", message);
                }
            }

            summary.record(&result);
        }

        info!(
            "Worker finished: {} cloned, {} updated, {} skipped, {} failed",
            summary.cloned, summary.updated, summary.skipped, summary.failed
        );

        summary
    }
    .instrument(span)
    .await
}

async fn sync_repository<G: GitOperations>(
    ctx: &WorkerContext,
    client: &GitClient<G>,
    org: &Organization,
    repo: &Repository,
) -> std::result::Result<SyncOutcome, SyncError> {
    let target = ctx.target(org, repo);

    // Filesystem checks and garbage removal block; keep them off the runtime
    // threads but under the worker's logger
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    let path = target.clone();
    let state = tokio::task::spawn_blocking(move || {
        tracing::dispatcher::with_default(&dispatch, || inspect(&path))
    })
    .await
    .unwrap_or_else(|e| Err(std::io::Error::other(e)))
    .map_err(|source| SyncError::Inspect {
        path: target.clone(),
        source,
    })?;
    debug!("{} is {:?}", target.display(), state);

    match plan(state) {
        SyncAction::Clone => client.clone_repository(org, repo, &target).await,
        SyncAction::Fetch => client.update_repository(org, repo, &target).await,
        SyncAction::Skip(Blocked::File) => Err(SyncError::RegularFile {
            repo: repo.name.clone(),
            path: target,
        }),
        SyncAction::Skip(Blocked::Permission) => Err(SyncError::NotWriteable {
            repo: repo.name.clone(),
            path: target,
        }),
    }
}
