//! Atomic reference updates through `git update-ref --stdin`

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::debug;

use super::{collect_output, combined_output};
use crate::{Error, Result};

/// One mutation queued in a [`RefTransaction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdate {
    /// Point a direct reference at an object
    Update { name: String, target: String },
    /// Point a symbolic reference at another reference
    SymrefUpdate { name: String, target: String },
    /// Delete a reference
    Delete { name: String },
    /// Delete a symbolic reference itself
    SymrefDelete { name: String },
}

impl fmt::Display for RefUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefUpdate::Update { name, target } => write!(f, "update {} {}", name, target),
            RefUpdate::SymrefUpdate { name, target } => {
                write!(f, "symref-update {} {}", name, target)
            }
            RefUpdate::Delete { name } => write!(f, "delete {}", name),
            RefUpdate::SymrefDelete { name } => write!(f, "symref-delete {}", name),
        }
    }
}

/// A command for the update-ref stream, optionally applied without
/// dereferencing symbolic refs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefCommand {
    pub update: RefUpdate,
    pub no_deref: bool,
}

impl RefCommand {
    pub fn update(name: impl Into<String>, target: impl Into<String>) -> Self {
        RefUpdate::Update {
            name: name.into(),
            target: target.into(),
        }
        .into()
    }

    pub fn symref_update(name: impl Into<String>, target: impl Into<String>) -> Self {
        RefUpdate::SymrefUpdate {
            name: name.into(),
            target: target.into(),
        }
        .into()
    }

    pub fn delete(name: impl Into<String>) -> Self {
        RefUpdate::Delete { name: name.into() }.into()
    }

    pub fn symref_delete(name: impl Into<String>) -> Self {
        RefUpdate::SymrefDelete { name: name.into() }.into()
    }

    /// Act on the named ref itself rather than what it points at
    pub fn no_deref(mut self) -> Self {
        self.no_deref = true;
        self
    }

    /// Lines sent to `git update-ref --stdin`
    fn lines(&self) -> String {
        if self.no_deref {
            format!("option no-deref\n{}\n", self.update)
        } else {
            format!("{}\n", self.update)
        }
    }
}

impl From<RefUpdate> for RefCommand {
    fn from(update: RefUpdate) -> Self {
        Self {
            update,
            no_deref: false,
        }
    }
}

/// An all-or-nothing batch of reference updates.
///
/// Commands are streamed to git as they are pushed, but nothing is visible
/// until [`RefTransaction::commit`] succeeds. Dropping the transaction without
/// committing kills git and discards every queued command.
pub struct RefTransaction {
    child: Child,
    stdin: Option<ChildStdin>,
    queued: usize,
}

impl fmt::Debug for RefTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefTransaction")
            .field("queued", &self.queued)
            .field("child", &"<Child>")
            .finish()
    }
}

impl RefTransaction {
    /// Start a transaction against the repository at `repo`
    pub async fn open(repo: &Path) -> Result<Self> {
        let mut child = Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(["update-ref", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Command {
                command: "git update-ref --stdin".to_string(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take();
        let mut tx = Self {
            child,
            stdin,
            queued: 0,
        };
        tx.write("start\n").await?;
        Ok(tx)
    }

    /// Number of commands queued so far
    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Queue one command
    pub async fn push(&mut self, command: RefCommand) -> Result<()> {
        self.write(&command.lines()).await?;
        self.queued += 1;
        Ok(())
    }

    /// Prepare and commit every queued command, or none of them
    pub async fn commit(mut self) -> Result<()> {
        self.write("prepare\ncommit\n").await?;
        // closing stdin lets git finish
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .await
            .map_err(|e| Error::RefTransactionFailed {
                message: e.to_string(),
                output: String::new(),
            })?;
        if !output.status.success() {
            return Err(Error::RefTransactionFailed {
                message: format!("git update-ref exited with {}", output.status),
                output: combined_output(&output.stdout, &output.stderr),
            });
        }

        debug!(queued = self.queued, "Committed reference transaction");
        Ok(())
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(Error::RefTransactionFailed {
                message: "transaction already closed".to_string(),
                output: String::new(),
            });
        };
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            // git has gone away, its output says why
            drop(self.stdin.take());
            let output = collect_output(&mut self.child).await.unwrap_or_default();
            return Err(Error::RefTransactionFailed {
                message: e.to_string(),
                output,
            });
        }
        Ok(())
    }
}

/// A reference listed by [`query_refs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    /// Target if this is a symbolic reference
    pub symref: Option<String>,
}

impl RefEntry {
    pub fn is_symbolic(&self) -> bool {
        self.symref.is_some()
    }
}

/// List references matching any of the given prefixes.
///
/// Patterns follow `git for-each-ref`: a pattern matches refs equal to it or
/// below it up to a `/`. No patterns means no refs, not every ref.
pub async fn query_refs(repo: &Path, patterns: &[String]) -> Result<Vec<RefEntry>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let command = "git for-each-ref --stdin";
    let mut child = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["for-each-ref", "--format=%(refname) %(symref)", "--stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Command {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    let mut input = patterns.join("\n");
    input.push('\n');
    let mut stdin = child.stdin.take().ok_or_else(|| Error::Command {
        command: command.to_string(),
        message: "stdin unavailable".to_string(),
    })?;
    // feed patterns while git drains them, so large pattern sets cannot
    // deadlock against a full output pipe
    let feed = tokio::spawn(async move {
        let result = stdin.write_all(input.as_bytes()).await;
        drop(stdin);
        result
    });

    let output = child.wait_with_output().await?;
    feed.await
        .map_err(|e| Error::Other(format!("Pattern writer failed: {}", e)))??;
    if !output.status.success() {
        return Err(Error::Command {
            command: command.to_string(),
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(parse_ref_listing(&String::from_utf8_lossy(&output.stdout)))
}

/// Symbolic references among `names` whose target does not exist.
///
/// `git for-each-ref` skips these as broken, so [`query_refs`] never lists
/// them. A remote's HEAD stays dangling until the remote is fetched.
pub fn dangling_symrefs(repo: &Path, names: &[String]) -> Result<Vec<RefEntry>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let repo = git2::Repository::open(repo)?;
    let mut found = Vec::new();
    for name in names {
        let reference = match repo.find_reference(name) {
            Ok(reference) => reference,
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec
                ) =>
            {
                continue
            }
            Err(e) => return Err(e.into()),
        };
        let Some(target) = reference.symbolic_target() else {
            continue;
        };
        if reference.resolve().is_err() {
            found.push(RefEntry {
                name: name.clone(),
                symref: Some(target.to_string()),
            });
        }
    }
    Ok(found)
}

fn parse_ref_listing(listing: &str) -> Vec<RefEntry> {
    listing
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (name, symref) = line.split_once(' ').unwrap_or((line, ""));
            RefEntry {
                name: name.to_string(),
                symref: (!symref.is_empty()).then(|| symref.to_string()),
            }
        })
        .collect()
}
