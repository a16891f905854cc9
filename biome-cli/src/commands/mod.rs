//! CLI command implementations

pub mod categories;
pub mod fetch;
pub mod helper;
pub mod init;
pub mod owners;
pub mod remotes;

pub use fetch::FetchArgs;
pub use helper::ConfigEditHelperArgs;
pub use init::InitArgs;
pub use owners::{AddArgs, RemoveArgs};
pub use remotes::{HeadsArgs, RemotesArgs};

use std::path::PathBuf;
use std::sync::Arc;

use biome_core::{Biome, Config, RepositoryDirectory};
use biome_github::GitHubClient;

/// What every command runs against
#[derive(Debug)]
pub struct Context {
    /// Directory given with `-C`
    pub path: PathBuf,
    pub config: Config,
    pub verbose: bool,
}

impl Context {
    /// GitHub, authenticated from the environment and secrets file
    pub fn directory(&self) -> anyhow::Result<Arc<dyn RepositoryDirectory>> {
        Ok(Arc::new(GitHubClient::from_env()?))
    }

    /// Open the biome in the working directory
    pub fn load(&self) -> anyhow::Result<Biome> {
        Ok(Biome::load(
            &self.path,
            self.directory()?,
            self.config.biome_options(),
        )?)
    }
}
