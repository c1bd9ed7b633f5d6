//! gstore - Synchronize GitHub repositories of your organizations
//!
//! gstore lists the repositories of your GitHub organizations and mirrors
//! them under a local directory, one subdirectory per organization. Missing
//! repositories are cloned, existing clones are fetched and pulled, and the
//! work is spread across parallel workers.
//!
//! ## Modules
//!
//! - [`config`]: Configuration file and environment lookups
//! - [`github`]: GitHub API integration
//! - [`git`]: Git operations and the clone/update policy
//! - [`inspect`] and [`plan`]: Local state classification and sync decisions
//! - [`sync`]: Parallel dispatch of repositories to workers
//! - [`logging`]: Process and per-worker loggers

pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod path;
pub mod plan;
pub mod sync;

pub use config::Config;
pub use error::{ClientError, GitError, SyncError};
pub use git::{GitCli, GitClient, GitOperations, RemoteConfig, RemoteProtocol, SyncOutcome};
pub use github::GitHubClient;
pub use models::{Organization, Repository};
pub use path::normalize;
pub use sync::{sync, SyncEngine, SyncOptions};
