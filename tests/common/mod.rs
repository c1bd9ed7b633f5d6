//! Common test utilities and helpers for gstore tests
#![allow(dead_code)]

use async_trait::async_trait;
use gstore::{GitError, GitOperations, Organization, Repository};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A git invocation seen by `RecordingGit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clone { url: String, target: PathBuf },
    Fetch(PathBuf),
    Pull(PathBuf),
}

/// Fake git backend that materializes `.git` on clone and records every call
#[derive(Default)]
pub struct RecordingGit {
    calls: Mutex<Vec<Call>>,
    failing: Vec<String>,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones of URLs ending in `/{name}.git` fail
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: names.iter().map(|n| format!("/{}.git", n)).collect(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clone_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Clone { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GitOperations for RecordingGit {
    async fn clone_repo(&self, url: &str, target: &Path) -> Result<(), GitError> {
        self.record(Call::Clone {
            url: url.to_string(),
            target: target.to_path_buf(),
        });

        if self.failing.iter().any(|suffix| url.ends_with(suffix.as_str())) {
            return Err(GitError::Command {
                command: format!("git clone {}", url),
                status: Some(128),
                stdout: None,
                stderr: Some(format!("fatal: repository '{}' not found\n", url)),
            });
        }

        std::fs::create_dir_all(target.join(".git")).expect("Failed to create .git");
        Ok(())
    }

    async fn has_branch_heads(&self, _repo: &Path) -> Result<bool, GitError> {
        Ok(true)
    }

    async fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        self.record(Call::Fetch(repo.to_path_buf()));
        Ok(())
    }

    async fn pull(&self, repo: &Path) -> Result<(), GitError> {
        self.record(Call::Pull(repo.to_path_buf()));
        Ok(())
    }
}

/// An organization with the given repository names
pub fn org_with(login: &str, names: &[&str]) -> (Organization, Vec<Repository>) {
    let org = Organization::new(login);
    let shared = Arc::new(org.clone());
    let repos = names
        .iter()
        .map(|name| Repository::new(*name, Arc::clone(&shared)))
        .collect();

    (org, repos)
}
