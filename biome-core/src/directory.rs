//! The repository directory: where owners and their repositories are looked up

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::owner::Owner;
use crate::Result;

/// A repository as reported by the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    /// Web URL of the repository, ex. `https://github.com/cli/cli`
    pub url: String,

    #[serde(rename = "isArchived", default)]
    pub archived: bool,

    #[serde(rename = "isDisabled", default)]
    pub disabled: bool,

    #[serde(rename = "isLocked", default)]
    pub locked: bool,

    /// Default branch, absent for empty repositories
    #[serde(rename = "defaultBranchRef", default)]
    pub default_branch: Option<BranchRef>,
}

/// A branch on the remote host, split the way GitHub reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchRef {
    /// Short name, ex. `main`
    pub name: String,
    /// Namespace, ex. `refs/heads/`
    pub prefix: String,
}

impl BranchRef {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }

    /// A branch under `refs/heads/`
    pub fn head(name: impl Into<String>) -> Self {
        Self::new(name, "refs/heads/")
    }
}

/// Lookup service for repository owners and their repositories.
///
/// Implementations handle pagination and authentication themselves.
#[async_trait]
pub trait RepositoryDirectory: Send + Sync {
    /// Succeeds if the owner exists on its host
    async fn validate_owner(&self, owner: &Owner) -> Result<()>;

    /// Every repository currently owned by the owner
    async fn list_repositories(&self, owner: &Owner) -> Result<Vec<RepositoryDescriptor>>;
}
