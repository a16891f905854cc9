//! `biome init`

use std::path::PathBuf;

use biome_core::Biome;
use clap::Args;

use super::Context;

/// Initialize a new biome: a bare git repository tuned for many remotes
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create the biome in, relative to -C
    #[arg(value_name = "DIRECTORY")]
    pub path: Option<PathBuf>,

    /// Do not register the biome with `git maintenance`
    #[arg(long)]
    pub skip_maintenance: bool,
}

impl InitArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let path = match &self.path {
            Some(dir) => ctx.path.join(dir),
            None => ctx.path.clone(),
        };

        let mut options = ctx.config.biome_options();
        if self.skip_maintenance {
            options.start_maintenance = false;
        }

        let biome = Biome::init(&path, ctx.directory()?, options).await?;
        if ctx.verbose {
            eprintln!("Initialized biome in {}", biome.path().display());
        }
        Ok(())
    }
}
