//! Error types raised by the sync engine and the GitHub client

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Failure of an external git invocation
#[derive(Error, Debug)]
pub enum GitError {
    /// The git binary could not be started at all
    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// git ran and exited unsuccessfully
    #[error("{command} failed")]
    Command {
        command: String,
        status: Option<i32>,
        stdout: Option<String>,
        stderr: Option<String>,
    },
}

impl GitError {
    /// Build a `Command` error from raw process output, dropping blank streams
    pub fn from_output(command: impl Into<String>, output: &std::process::Output) -> Self {
        let stream = |bytes: &[u8]| {
            let text = String::from_utf8_lossy(bytes).into_owned();
            (!text.trim().is_empty()).then_some(text)
        };

        GitError::Command {
            command: command.into(),
            status: output.status.code(),
            stdout: stream(&output.stdout),
            stderr: stream(&output.stderr),
        }
    }
}

/// Terminal outcome for one repository. Never propagated past the worker.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unable to sync {repo}. The path {} is a regular file", .path.display())]
    RegularFile { repo: String, path: PathBuf },

    #[error("Unable to sync {repo}. The path {} is not writeable", .path.display())]
    NotWriteable { repo: String, path: PathBuf },

    #[error("Failed to clone {full_name}")]
    Clone {
        full_name: String,
        messages: Vec<String>,
    },

    #[error("Failed to update {full_name}")]
    Update {
        full_name: String,
        messages: Vec<String>,
    },

    #[error("Unable to inspect {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Detail lines reported after the headline
    pub fn messages(&self) -> &[String] {
        match self {
            SyncError::Clone { messages, .. } | SyncError::Update { messages, .. } => messages,
            _ => &[],
        }
    }
}

/// Errors raised by the GitHub API client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("GitHub token is not provided or it is empty")]
    MissingToken,

    #[error("Bad token was used when accessing the GitHub API")]
    InvalidCredentials,

    #[error("Invalid GitHub API host: {0}")]
    InvalidHost(String),

    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}|\n").expect("valid whitespace regex"))
}

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:std(?:out|err)|error):[ ]*'?").expect("valid prefix regex"))
}

/// Collapse a raw git stream into a single human-readable line
pub fn normalize_git_output(raw: &str) -> String {
    let collapsed = whitespace_regex().replace_all(raw, " ");
    let stripped = prefix_regex().replace_all(&collapsed, "");

    stripped
        .trim_matches(|c: char| c == ' ' || c == '.' || c == '\'')
        .to_string()
}

/// Turn a git failure into log lines: one per non-empty output stream
pub fn parse_git_errors(err: &GitError) -> Vec<String> {
    match err {
        GitError::Spawn { .. } => vec![err.to_string()],
        GitError::Command { stdout, stderr, .. } => [stdout, stderr]
            .into_iter()
            .flatten()
            .map(|stream| normalize_git_output(stream))
            .filter(|line| !line.is_empty())
            .collect(),
    }
}
