//! Value objects shared by the API client and the sync engine

use std::fmt;
use std::sync::Arc;

/// A GitHub account or namespace owning repositories
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Organization {
    pub login: String,
}

impl Organization {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }

    /// Compare against a user-supplied name, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        self.login.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.login)
    }
}

/// A single repository belonging to an organization
///
/// The organization is shared, not owned: every repository listed for one
/// organization points at the same `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub organization: Arc<Organization>,
}

impl Repository {
    pub fn new(name: impl Into<String>, organization: Arc<Organization>) -> Self {
        Self {
            name: name.into(),
            organization,
        }
    }

    /// Display name in `org/repo` format
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization.login, self.name)
    }
}
