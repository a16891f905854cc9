//! Remotes discovered in the biome and the categories they are filed under

use std::fmt;
use std::str::FromStr;

use git2::{Reference, ReferenceFormat};
use serde::{Deserialize, Serialize};

use crate::directory::RepositoryDescriptor;
use crate::{Error, Result};

/// A git remote in the biome configuration.
///
/// Fetchable remotes are stored as real git remotes so references and objects
/// can be fetched from them. The biome also records whether the repository is
/// still active and fetchable on GitHub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Remote {
    /// Name of the git remote, `<host>/<owner>/<repo>`
    pub name: String,

    /// Archived on GitHub, no longer receiving new content.
    /// https://docs.github.com/en/repositories/archiving-a-github-repository
    pub archived: bool,

    /// Disabled on GitHub. Rare and undocumented; disabled repositories
    /// cannot be fetched.
    pub disabled: bool,

    /// Locked on GitHub, usually after a migration to another forge. Locked
    /// repositories cannot be fetched.
    /// https://docs.github.com/en/migrations/overview/about-locked-repositories
    pub locked: bool,
}

impl Remote {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// URL to fetch references and objects from
    pub fn fetch_url(&self) -> String {
        format!("https://{}.git", self.name)
    }

    /// Refspec syncing every `refs/*` of the remote to
    /// `refs/remotes/<name>/*` locally.
    ///
    /// Fails when the destination is not a valid refspec pattern, ex. for
    /// `.github` repositories whose names cannot be a ref path component.
    pub fn fetch_refspec(&self) -> Result<String> {
        let dst = format!("refs/remotes/{}/*", self.name);
        Reference::normalize_name(&dst, ReferenceFormat::REFSPEC_PATTERN).map_err(|_| {
            Error::InvalidRefspec {
                remote: self.name.clone(),
                pattern: dst.clone(),
            }
        })?;
        Ok(format!("+refs/*:{}", dst))
    }

    /// Whether this tool can configure the remote at all
    pub fn supported(&self) -> bool {
        self.fetch_refspec().is_ok()
    }

    /// Symbolic reference pointing at the remote's default branch
    pub fn head(&self) -> String {
        format!("refs/remotes/{}/HEAD", self.name)
    }

    /// Reference namespace holding everything fetched from this remote
    pub fn namespace(&self) -> String {
        format!("refs/remotes/{}/", self.name)
    }

    /// The single category this remote is filed under
    pub fn category(&self) -> RemoteCategory {
        if self.disabled {
            RemoteCategory::Disabled
        } else if self.locked {
            RemoteCategory::Locked
        } else if !self.supported() {
            RemoteCategory::Unsupported
        } else if self.archived {
            RemoteCategory::Archived
        } else {
            RemoteCategory::Active
        }
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Desired state of one remote: its identity plus where its HEAD should point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub remote: Remote,

    /// Fully qualified HEAD target, empty when the repository has no default
    /// branch
    pub head: String,
}

impl RemoteConfig {
    /// Map a repository reported by the directory to its remote
    pub fn from_repository(repo: &RepositoryDescriptor) -> Result<Self> {
        let url = url::Url::parse(&repo.url).map_err(|e| {
            Error::Other(format!("Invalid repository URL {:?}: {}", repo.url, e))
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Other(format!("Repository URL has no host: {:?}", repo.url)))?;
        let path = url.path().trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        if path.is_empty() {
            return Err(Error::Other(format!(
                "Repository URL has no path: {:?}",
                repo.url
            )));
        }

        let remote = Remote {
            name: format!("{}/{}", host, path),
            archived: repo.archived,
            disabled: repo.disabled,
            locked: repo.locked,
        };
        let head = match &repo.default_branch {
            Some(branch) => format!(
                "refs/remotes/{}/{}{}",
                remote.name,
                branch.prefix.trim_start_matches("refs/"),
                branch.name
            ),
            None => String::new(),
        };

        Ok(Self { remote, head })
    }
}

/// How a discovered remote is handled by the biome.
///
/// Only [`RemoteCategory::FETCHABLE`] categories become real git remotes; the
/// others are recorded for reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteCategory {
    /// Not archived, disabled or locked, and supported by this tool
    Active,
    /// Archived on GitHub; still fetchable
    Archived,
    /// Disabled on GitHub; not fetchable
    Disabled,
    /// Locked on GitHub; not fetchable
    Locked,
    /// Name cannot be used as a ref namespace
    Unsupported,
}

impl RemoteCategory {
    pub const ALL: [RemoteCategory; 5] = [
        RemoteCategory::Active,
        RemoteCategory::Archived,
        RemoteCategory::Disabled,
        RemoteCategory::Locked,
        RemoteCategory::Unsupported,
    ];

    pub const FETCHABLE: [RemoteCategory; 2] = [RemoteCategory::Active, RemoteCategory::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCategory::Active => "active",
            RemoteCategory::Archived => "archived",
            RemoteCategory::Disabled => "disabled",
            RemoteCategory::Locked => "locked",
            RemoteCategory::Unsupported => "unsupported",
        }
    }

    pub fn is_fetchable(&self) -> bool {
        matches!(self, RemoteCategory::Active | RemoteCategory::Archived)
    }

    /// Apply the flag this category implies to a remote rebuilt from config
    pub(crate) fn mark(&self, remote: &mut Remote) {
        match self {
            RemoteCategory::Archived => remote.archived = true,
            RemoteCategory::Disabled => remote.disabled = true,
            RemoteCategory::Locked => remote.locked = true,
            RemoteCategory::Active | RemoteCategory::Unsupported => {}
        }
    }
}

impl fmt::Display for RemoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RemoteCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Other(format!("Unknown remote category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::BranchRef;

    #[test]
    fn test_fetch_refspec() {
        let remote = Remote::new("github.com/orirawlings/bar");
        assert_eq!(
            remote.fetch_refspec().unwrap(),
            "+refs/*:refs/remotes/github.com/orirawlings/bar/*"
        );
        assert!(remote.supported());
    }

    #[test]
    fn test_dot_prefixed_repo_is_unsupported() {
        let remote = Remote::new("github.com/orirawlings/.github");
        let err = remote.fetch_refspec().unwrap_err();
        assert!(matches!(err, Error::InvalidRefspec { .. }));
        assert!(!remote.supported());
        assert_eq!(remote.category(), RemoteCategory::Unsupported);
    }

    #[test]
    fn test_head_and_url() {
        let remote = Remote::new("github.com/cli/cli");
        assert_eq!(remote.head(), "refs/remotes/github.com/cli/cli/HEAD");
        assert_eq!(remote.fetch_url(), "https://github.com/cli/cli.git");
    }

    #[test]
    fn test_category_precedence() {
        let mut remote = Remote::new("github.com/orirawlings/x");
        assert_eq!(remote.category(), RemoteCategory::Active);

        remote.archived = true;
        assert_eq!(remote.category(), RemoteCategory::Archived);

        remote.locked = true;
        assert_eq!(remote.category(), RemoteCategory::Locked);

        remote.disabled = true;
        assert_eq!(remote.category(), RemoteCategory::Disabled);

        let unsupported_archived = Remote {
            name: "github.com/orirawlings/.github".to_string(),
            archived: true,
            ..Remote::default()
        };
        assert_eq!(unsupported_archived.category(), RemoteCategory::Unsupported);
    }

    #[test]
    fn test_remote_config_from_repository() {
        let repo = RepositoryDescriptor {
            url: "https://github.com/orirawlings/bar".to_string(),
            default_branch: Some(BranchRef::head("main")),
            ..RepositoryDescriptor::default()
        };
        let cfg = RemoteConfig::from_repository(&repo).unwrap();
        assert_eq!(cfg.remote, Remote::new("github.com/orirawlings/bar"));
        assert_eq!(cfg.head, "refs/remotes/github.com/orirawlings/bar/heads/main");
    }

    #[test]
    fn test_remote_config_without_default_branch() {
        let repo = RepositoryDescriptor {
            url: "https://my.github.biz/foobar/bazbiz".to_string(),
            locked: true,
            ..RepositoryDescriptor::default()
        };
        let cfg = RemoteConfig::from_repository(&repo).unwrap();
        assert_eq!(cfg.remote.name, "my.github.biz/foobar/bazbiz");
        assert!(cfg.remote.locked);
        assert!(cfg.head.is_empty());
    }

    #[test]
    fn test_remote_config_rejects_bad_url() {
        let repo = RepositoryDescriptor {
            url: "not a url".to_string(),
            ..RepositoryDescriptor::default()
        };
        assert!(RemoteConfig::from_repository(&repo).is_err());
    }

    #[test]
    fn test_category_round_trip() {
        for category in RemoteCategory::ALL {
            assert_eq!(category.to_string().parse::<RemoteCategory>().unwrap(), category);
        }
        assert!("bogus".parse::<RemoteCategory>().is_err());
    }
}
