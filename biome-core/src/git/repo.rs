//! Repository setup, validation and fetching

use std::path::Path;
use std::process::Stdio;

use git2::{ConfigLevel, ErrorCode, Repository, RepositoryInitOptions};
use tokio::process::Command;
use tracing::{debug, info};

use crate::{Error, Result};

/// Biome config schema version this tool reads and writes
pub const SCHEMA_VERSION: &str = "1";

/// Config key holding the schema version
pub(crate) const VERSION_KEY: &str = "biome.version";

/// Check that `path` is a git repository carrying a supported biome schema.
pub fn validate(path: &Path) -> Result<()> {
    let repo = Repository::open(path).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            Error::NotARepository(path.to_path_buf())
        } else {
            Error::Git(e)
        }
    })?;

    let config = repo.config()?.open_level(ConfigLevel::Local)?;
    match config.get_string(VERSION_KEY) {
        Ok(version) if version == SCHEMA_VERSION => Ok(()),
        Ok(version) => Err(Error::SchemaVersionMismatch {
            expected: SCHEMA_VERSION.to_string(),
            found: version,
        }),
        Err(e) if e.code() == ErrorCode::NotFound => {
            Err(Error::SchemaVersionMissing(path.to_path_buf()))
        }
        Err(e) => Err(Error::Git(e)),
    }
}

/// Create an empty bare repository at `path`, creating parent directories
pub fn init_bare(path: &Path) -> Result<()> {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).mkpath(true);
    Repository::init_opts(path, &opts)?;
    info!(path = %path.display(), "Initialized bare repository");
    Ok(())
}

/// Fetch the given remote groups, or every remote when `groups` is empty.
///
/// git's progress output is passed through to our stderr.
pub async fn fetch(path: &Path, groups: &[String]) -> Result<()> {
    let mut args = vec!["fetch".to_string()];
    if groups.is_empty() {
        args.push("--all".to_string());
    } else {
        args.push("--multiple".to_string());
        args.extend(groups.iter().cloned());
    }
    run_git(path, &args).await
}

/// Register the repository for background `git maintenance`
pub async fn start_maintenance(path: &Path) -> Result<()> {
    run_git(path, &["maintenance".to_string(), "start".to_string()]).await
}

async fn run_git(path: &Path, args: &[String]) -> Result<()> {
    let command = format!("git -C {} {}", path.display(), args.join(" "));
    debug!(command = %command, "Running git");

    let status = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| Error::Command {
            command: command.clone(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(Error::Command {
            command,
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        assert!(matches!(validate(&path), Err(Error::NotARepository(_))));
    }

    #[test]
    fn test_validate_plain_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(validate(dir.path()), Err(Error::NotARepository(_))));
    }

    #[test]
    fn test_validate_repository_without_version() {
        let dir = tempfile::tempdir().unwrap();
        init_bare(dir.path()).unwrap();
        assert!(matches!(
            validate(dir.path()),
            Err(Error::SchemaVersionMissing(_))
        ));
    }

    #[test]
    fn test_validate_versions() {
        let dir = tempfile::tempdir().unwrap();
        init_bare(dir.path()).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let mut config = repo.config().unwrap().open_level(ConfigLevel::Local).unwrap();

        config.set_str(VERSION_KEY, "2").unwrap();
        match validate(dir.path()) {
            Err(Error::SchemaVersionMismatch { expected, found }) => {
                assert_eq!(expected, "1");
                assert_eq!(found, "2");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        config.set_str(VERSION_KEY, SCHEMA_VERSION).unwrap();
        validate(dir.path()).unwrap();
    }

    #[test]
    fn test_init_bare_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b");
        init_bare(&path).unwrap();
        let repo = Repository::open(&path).unwrap();
        assert!(repo.is_bare());
    }
}
