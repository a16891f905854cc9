//! A git config file under edit, read and written through libgit2
//!
//! Keys are full dotted names, ex. `remote.github.com/cli/cli.url`. libgit2
//! edits the file in place, so comments, layout and values we never touch
//! survive every write.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::{Config, ConfigEntries, ErrorCode};
use tempfile::TempDir;

use crate::Result;

/// File name of the private copy inside its scratch directory
const SCRATCH_NAME: &str = "config";

/// Private working copy of a git config file.
///
/// Changes land in the copy only; [`GitConfig::save_to`] publishes them.
#[derive(Debug)]
pub struct GitConfig {
    path: PathBuf,
    _scratch: TempDir,
}

impl GitConfig {
    /// Copy the config file at `source` into a fresh scratch directory and
    /// check that libgit2 can parse it
    pub async fn load(source: &Path) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("biome-config-").tempdir()?;
        let path = scratch.path().join(SCRATCH_NAME);
        tokio::fs::copy(source, &path).await?;
        let config = Self {
            path,
            _scratch: scratch,
        };
        config.open()?;
        Ok(config)
    }

    /// Scratch config holding `text`
    #[cfg(test)]
    pub(crate) fn from_text(text: &str) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("biome-config-").tempdir()?;
        let path = scratch.path().join(SCRATCH_NAME);
        std::fs::write(&path, text)?;
        let config = Self {
            path,
            _scratch: scratch,
        };
        config.open()?;
        Ok(config)
    }

    /// Contents of the working copy
    #[cfg(test)]
    pub(crate) fn text(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }

    fn open(&self) -> Result<Config> {
        Ok(Config::open(&self.path)?)
    }

    /// Last value of `key`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.open()?.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every value of a multi-valued `key`, in file order
    pub fn get_all(&self, key: &str) -> Result<Vec<String>> {
        let config = self.open()?;
        let values = match config.multivar(key, None) {
            Ok(entries) => collect(entries)?,
            Err(e) if e.code() == ErrorCode::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(values.into_iter().map(|(_, value)| value).collect())
    }

    /// Distinct names of the entries matching the regular expression
    /// `pattern`. Section and variable parts come back lowercased.
    pub fn names(&self, pattern: &str) -> Result<BTreeSet<String>> {
        let config = self.open()?;
        let entries = collect(config.entries(Some(pattern))?)?;
        Ok(entries.into_iter().map(|(name, _)| name).collect())
    }

    /// Replace every value of `key` with one
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.unset_all(key)?;
        self.open()?.set_str(key, value)?;
        Ok(())
    }

    /// Append a value to a multi-valued `key`
    pub fn add(&mut self, key: &str, value: &str) -> Result<()> {
        // matches only empty values, which are never stored, so this appends
        self.open()?.set_multivar(key, "$^", value)?;
        Ok(())
    }

    /// Remove every value of `key`; a missing key is fine
    pub fn unset_all(&mut self, key: &str) -> Result<()> {
        match self.open()?.remove_multivar(key, ".*") {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every entry whose name matches the regular expression `pattern`
    pub fn unset_matching(&mut self, pattern: &str) -> Result<()> {
        for name in self.names(pattern)? {
            self.unset_all(&name)?;
        }
        Ok(())
    }

    /// Overwrite `target` with the working copy, keeping its permissions
    pub async fn save_to(&self, target: &Path) -> Result<()> {
        let bytes = tokio::fs::read(&self.path).await?;
        tokio::fs::write(target, bytes).await?;
        Ok(())
    }
}

fn collect(mut entries: ConfigEntries<'_>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    while let Some(entry) = entries.next() {
        let entry = entry?;
        pairs.push((
            String::from_utf8_lossy(entry.name_bytes()).into_owned(),
            String::from_utf8_lossy(entry.value_bytes()).into_owned(),
        ));
    }
    Ok(pairs)
}
