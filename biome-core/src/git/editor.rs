//! Exclusive edits of a repository's local git config
//!
//! `git config --local --edit` runs `GIT_EDITOR` on the repository's config
//! file. The editor we hand it is a tiny helper process that connects back to
//! us over a Unix socket and reports which file git opened. We load that file,
//! let the caller transform it, write it back and tell the helper whether to
//! succeed. Git does not lock the file for an editor, so every session holds a
//! [`ConfigLock`] from before git starts until it exits.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::process::Command;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::collect_output;
use super::config_file::GitConfig;
use super::lock::ConfigLock;
use crate::{Error, Result};

/// Subcommand of the biome binary that acts as the editor helper
pub const HELPER_SUBCOMMAND: &str = "config-edit-helper";

const EDIT_COMMAND: &str = "git config --local --edit";

/// First line the helper sends: the file git asked it to edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub path: PathBuf,
}

/// Our answer to the helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EditReply {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// What a transform wants done with the config it was given
#[derive(Debug)]
pub enum Outcome<T> {
    /// Write the config back, then return the value
    Save(GitConfig, T),
    /// Leave the file untouched, return the value
    Keep(T),
}

/// Settings for config edit sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorOptions {
    /// Program and leading arguments of the editor helper. The socket path and
    /// the file to edit are appended. Defaults to this executable's
    /// `config-edit-helper` subcommand.
    pub helper_command: Option<Vec<String>>,

    /// Give up on a session after this long
    pub timeout: Option<Duration>,
}

impl EditorOptions {
    pub fn with_helper_command(mut self, command: Vec<String>) -> Self {
        self.helper_command = Some(command);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the helper invocation
    fn helper(&self) -> Result<Vec<String>> {
        match &self.helper_command {
            Some(command) if command.is_empty() => Err(Error::Config(
                "Editor helper command must not be empty".to_string(),
            )),
            Some(command) => Ok(command.clone()),
            None => {
                let exe = std::env::current_exe()?;
                Ok(vec![
                    exe.to_string_lossy().into_owned(),
                    HELPER_SUBCOMMAND.to_string(),
                ])
            }
        }
    }
}

/// How the wait for the helper ended
enum Rendezvous {
    Connected(UnixStream),
    Exited(ExitStatus),
    Cancelled,
}

/// Runs config edit sessions against one repository
#[derive(Debug, Clone)]
pub struct Editor {
    repo: PathBuf,
    options: EditorOptions,
}

impl Editor {
    pub fn new(repo: impl Into<PathBuf>, options: EditorOptions) -> Self {
        Self {
            repo: repo.into(),
            options,
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Run one exclusive read, transform, conditional write cycle.
    ///
    /// Dropping the returned future kills git, which discards any pending
    /// change.
    pub async fn edit<T, F, Fut>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(GitConfig) -> Fut,
        Fut: Future<Output = Result<Outcome<T>>>,
    {
        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        let _lock = ConfigLock::acquire(&self.repo, deadline).await?;

        let socket_dir = tempfile::Builder::new().prefix("biome-edit-").tempdir()?;
        let socket = socket_dir.path().join("editor.sock");
        let listener = UnixListener::bind(&socket)?;

        let mut editor = shell_join(&self.options.helper()?);
        editor.push(' ');
        editor.push_str(&shell_quote(&socket.to_string_lossy()));

        debug!(repo = %self.repo.display(), editor = %editor, "Starting config edit");
        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(["config", "--local", "--edit"])
            .env("GIT_EDITOR", &editor)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Command {
                command: EDIT_COMMAND.to_string(),
                message: e.to_string(),
            })?;

        let rendezvous = tokio::select! {
            accepted = listener.accept() => Rendezvous::Connected(accepted?.0),
            status = child.wait() => Rendezvous::Exited(status?),
            _ = until(deadline) => Rendezvous::Cancelled,
        };

        let stream = match rendezvous {
            Rendezvous::Connected(stream) => stream,
            Rendezvous::Exited(status) => {
                let output = tokio::select! {
                    output = collect_output(&mut child) => output.unwrap_or_default(),
                    _ = until(deadline) => String::new(),
                };
                return Err(Error::HelperDidNotConnect {
                    command: EDIT_COMMAND.to_string(),
                    status: status.to_string(),
                    output,
                });
            }
            Rendezvous::Cancelled => {
                warn!(repo = %self.repo.display(), "Config edit timed out waiting for helper");
                return Err(Error::Cancelled);
            }
        };

        let (replied_ok, result) = serve(stream, transform, deadline).await?;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = until(deadline) => return Err(Error::Cancelled),
        };
        let value = result?;
        if replied_ok && !status.success() {
            let output = collect_output(&mut child).await.unwrap_or_default();
            return Err(Error::Command {
                command: EDIT_COMMAND.to_string(),
                message: format!("{}\n{}", status, output),
            });
        }

        debug!(repo = %self.repo.display(), "Finished config edit");
        Ok(value)
    }
}

/// Handle one connected helper: read its request, run the session and reply.
///
/// Returns whether the helper was told to succeed along with the session
/// result. Errors only when talking to the helper itself fails.
async fn serve<T, F, Fut>(
    stream: UnixStream,
    transform: F,
    deadline: Option<Instant>,
) -> Result<(bool, Result<T>)>
where
    F: FnOnce(GitConfig) -> Fut,
    Fut: Future<Output = Result<Outcome<T>>>,
{
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    let line = tokio::select! {
        line = lines.next_line() => line?,
        _ = until(deadline) => return Err(Error::Cancelled),
    };
    let Some(line) = line else {
        return Err(Error::Other(
            "Editor helper disconnected without a request".to_string(),
        ));
    };
    let request: EditRequest = serde_json::from_str(&line)?;

    let result = session(&request.path, transform, deadline).await;
    let reply = match &result {
        Ok(_) => EditReply::ok(),
        Err(e) => EditReply::failed(e.to_string()),
    };

    let mut bytes = serde_json::to_vec(&reply)?;
    bytes.push(b'\n');
    write.write_all(&bytes).await?;
    write.shutdown().await?;

    Ok((reply.ok, result))
}

async fn session<T, F, Fut>(path: &Path, transform: F, deadline: Option<Instant>) -> Result<T>
where
    F: FnOnce(GitConfig) -> Fut,
    Fut: Future<Output = Result<Outcome<T>>>,
{
    let load_failed = |message: String| Error::LoadFailed {
        path: path.to_path_buf(),
        message,
    };
    let config = GitConfig::load(path)
        .await
        .map_err(|e| load_failed(e.to_string()))?;

    let outcome = tokio::select! {
        outcome = transform(config) => outcome.map_err(|e| Error::TransformFailed(Box::new(e)))?,
        _ = until(deadline) => return Err(Error::Cancelled),
    };

    match outcome {
        Outcome::Keep(value) => Ok(value),
        Outcome::Save(config, value) => {
            config
                .save_to(path)
                .await
                .map_err(|e| Error::SaveFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            Ok(value)
        }
    }
}

/// Helper side of the rendezvous: report `path` to the editor session
/// listening on `socket` and wait for its verdict.
pub async fn call_back(socket: &Path, path: &Path) -> Result<()> {
    // git may hand the editor a path relative to its working directory
    let path = tokio::fs::canonicalize(path).await?;

    let stream = UnixStream::connect(socket).await?;
    let (read, mut write) = stream.into_split();

    let mut request = serde_json::to_vec(&EditRequest { path })?;
    request.push(b'\n');
    write.write_all(&request).await?;

    let mut lines = BufReader::new(read).lines();
    let Some(line) = lines.next_line().await? else {
        return Err(Error::Other(
            "Config editor closed the connection without replying".to_string(),
        ));
    };
    let reply: EditReply = serde_json::from_str(&line)?;
    if reply.ok {
        Ok(())
    } else {
        Err(Error::Other(
            reply
                .error
                .unwrap_or_else(|| "Config edit failed".to_string()),
        ))
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Quote a word for `sh`, leaving plain words alone
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn shell_join(words: &[String]) -> String {
    words
        .iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}
