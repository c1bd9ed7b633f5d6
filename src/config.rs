use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::git::RemoteConfig;

/// Environment variables searched for a GitHub token, highest precedence first
pub const TOKEN_NAMES: [&str; 4] = [
    "GH_TOKEN",
    "GITHUB_TOKEN",
    "GH_ENTERPRISE_TOKEN",
    "GITHUB_ENTERPRISE_TOKEN",
];

/// API host override
pub const HOST_VAR: &str = "GH_HOST";

/// Base target directory override
pub const TARGET_VAR: &str = "GSTORE_DIR";

/// Main configuration structure for gstore
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Base directory for repository synchronization
    #[serde(default)]
    pub base_directory: Option<String>,

    /// GitHub API and selection settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GitHubConfig {
    /// API host, api.github.com when unset
    pub host: Option<String>,

    /// Organizations to sync (all of the user's when empty)
    #[serde(default)]
    pub organizations: Vec<String>,

    /// `org:repo` patterns limiting what gets synced
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SyncConfig {
    /// Number of parallel workers (CPU count when unset)
    pub jobs: Option<usize>,

    /// Remote URL settings
    #[serde(flatten)]
    pub remote: RemoteConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults when it is missing
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("gstore").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(dir) = &self.base_directory {
            let expanded = shellexpand::full(dir)
                .context("Failed to expand base_directory path")?
                .into_owned();
            self.base_directory = Some(expanded);
        }

        Ok(())
    }

    /// Target directory: CLI, then `GSTORE_DIR`, then the file, then the
    /// current directory
    pub fn target(&self, cli: Option<&str>) -> Result<String> {
        if let Some(dir) = first_non_empty([cli.map(str::to_string), get_target()]) {
            return Ok(dir);
        }

        if let Some(dir) = self.base_directory.as_deref().filter(|d| !d.is_empty()) {
            return Ok(dir.to_string());
        }

        let cwd = env::current_dir().context("Failed to get current directory")?;
        Ok(cwd.to_string_lossy().into_owned())
    }

    /// API host: CLI, then `GH_HOST`, then the file
    pub fn host(&self, cli: Option<&str>) -> Option<String> {
        first_non_empty([cli.map(str::to_string), get_host(), self.github.host.clone()])
    }

    /// Worker count requested by CLI or file
    pub fn jobs(&self, cli: Option<usize>) -> Option<usize> {
        cli.or(self.sync.jobs)
    }

    pub fn remote(&self) -> RemoteConfig {
        self.sync.remote.clone()
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// First non-empty token from `TOKEN_NAMES`
pub fn lookup_token() -> Option<String> {
    TOKEN_NAMES.iter().find_map(|name| non_empty_var(name))
}

pub fn get_host() -> Option<String> {
    non_empty_var(HOST_VAR)
}

pub fn get_target() -> Option<String> {
    non_empty_var(TARGET_VAR)
}
