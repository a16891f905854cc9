//! Secrets management for biome
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/biome/secrets.toml` and must have
//! restrictive permissions (0600 on Unix). Tokens are kept per GitHub host so
//! one biome can span github.com and GitHub Enterprise servers.
//!
//! Loading priority:
//! 1. Environment variables (GH_TOKEN / GITHUB_TOKEN for github.com,
//!    GH_ENTERPRISE_TOKEN / GITHUB_ENTERPRISE_TOKEN for other hosts)
//! 2. Secrets file (~/.config/biome/secrets.toml)

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::owner::DEFAULT_HOST;
use crate::{Error, Result};

const PUBLIC_TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];
const ENTERPRISE_TOKEN_VARS: [&str; 2] = ["GH_ENTERPRISE_TOKEN", "GITHUB_ENTERPRISE_TOKEN"];

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Credentials keyed by GitHub host name
    pub hosts: BTreeMap<String, HostSecrets>,
}

/// Credentials for one GitHub host
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSecrets {
    /// Personal access token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // readable by group or others
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut secrets: Secrets = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        let hosts = std::mem::take(&mut secrets.hosts);
        for (host, mut host_secrets) in hosts {
            if let Some(ref mut token) = host_secrets.token {
                *token = token.trim().to_string();
            }
            secrets.hosts.insert(host.to_lowercase(), host_secrets);
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/biome/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("biome").join("secrets.toml"))
    }

    /// Token for a GitHub host, environment first, then the secrets file
    pub fn token(&self, host: &str) -> Option<String> {
        self.token_with_env(host, |var| std::env::var(var).ok())
    }

    fn token_with_env(&self, host: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        let host = host.to_lowercase();
        let vars = if host == DEFAULT_HOST {
            PUBLIC_TOKEN_VARS
        } else {
            ENTERPRISE_TOKEN_VARS
        };

        for var in vars {
            if let Some(token) = env(var) {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    debug!(host = %host, var, "Using GitHub token from environment");
                    return Some(token);
                }
            }
        }

        match self.hosts.get(&host).and_then(|h| h.token.as_ref()) {
            Some(token) if !token.is_empty() => {
                debug!(host = %host, "Using GitHub token from secrets file");
                Some(token.clone())
            }
            _ => None,
        }
    }
}
