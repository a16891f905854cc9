//! Git plumbing for the biome
//!
//! Repository setup, validation and config parsing go through libgit2. Config
//! edit sessions, reference transactions and fetches drive the git CLI so
//! git's own transaction semantics apply.

mod config_file;
mod editor;
mod lock;
mod refs;
mod repo;

pub use config_file::GitConfig;
pub use editor::{call_back, EditReply, EditRequest, Editor, EditorOptions, Outcome};
pub use lock::ConfigLock;
pub use refs::{dangling_symrefs, query_refs, RefCommand, RefEntry, RefTransaction, RefUpdate};
pub use repo::{fetch, init_bare, start_maintenance, validate, SCHEMA_VERSION};

use tokio::io::AsyncReadExt;
use tokio::process::Child;

/// Read whatever a finished child wrote and reap it, without consuming it
pub(crate) async fn collect_output(child: &mut Child) -> std::io::Result<String> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_end(&mut stdout).await?;
    }
    if let Some(mut err) = child.stderr.take() {
        err.read_to_end(&mut stderr).await?;
    }
    child.wait().await?;
    Ok(combined_output(&stdout, &stderr))
}

pub(crate) fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).into_owned();
    out.push_str(&String::from_utf8_lossy(stderr));
    out
}
