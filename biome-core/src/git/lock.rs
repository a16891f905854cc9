//! Exclusive access to a repository's config edits
//!
//! `git config --edit` opens the file without taking git's config lock, so two
//! edit sessions could each read the same config and the later write would
//! drop the earlier change. Sessions first take an advisory lock (`flock(2)`
//! on Unix) on a sidecar file in the git directory. The OS releases it if the
//! process dies.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use tokio::time::Instant;
use tracing::debug;

use crate::{Error, Result};

/// Lock file kept next to the repository's config
pub const LOCK_FILE: &str = "biome.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Held for as long as the value lives
#[derive(Debug)]
pub struct ConfigLock {
    _file: File,
}

impl ConfigLock {
    /// Lock the config of the repository at `repo`, waiting until `deadline`
    /// if another session holds it.
    pub async fn acquire(repo: &Path, deadline: Option<Instant>) -> Result<Self> {
        let path = lock_path(repo)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let mut waited = false;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { _file: file }),
                Err(_) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    return Err(Error::Cancelled);
                }
                Err(_) => {
                    if !waited {
                        debug!(lock = %path.display(), "Waiting for another config edit");
                        waited = true;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
}

fn lock_path(repo: &Path) -> Result<PathBuf> {
    let repository = git2::Repository::open(repo)?;
    Ok(repository.path().join(LOCK_FILE))
}
