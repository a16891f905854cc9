//! Hidden `biome config-edit-helper`, the `GIT_EDITOR` used by config edits

use std::path::PathBuf;

use clap::Args;

/// Report the config file git opened to the waiting edit session and exit
/// with its verdict
#[derive(Args, Debug)]
pub struct ConfigEditHelperArgs {
    /// Unix socket the edit session listens on
    pub socket: PathBuf,

    /// Config file git wants edited
    pub path: PathBuf,
}

impl ConfigEditHelperArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        biome_core::git::call_back(&self.socket, &self.path).await?;
        Ok(())
    }
}
