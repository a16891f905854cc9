//! `biome remotes` and `biome heads`

use clap::Args;

use super::categories::{CategoryFlags, FetchableCategoryFlags};
use super::Context;

/// List remotes discovered by the biome.
///
/// Not every discovered remote can be fetched, so not all of them are
/// configured as git remotes; this lists them regardless. Flags choose which
/// categories to include.
#[derive(Args, Debug)]
pub struct RemotesArgs {
    #[command(flatten)]
    pub categories: CategoryFlags,
}

impl RemotesArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let biome = ctx.load()?;
        for remote in biome.remotes(&self.categories.categories()).await? {
            println!("{}", remote);
        }
        Ok(())
    }
}

/// Print the HEAD reference of each remote, the tip of its primary branch.
///
/// The output can feed any analysis over the latest content of every
/// repository, ex. `biome heads | xargs git grep -i "search term"`.
#[derive(Args, Debug)]
pub struct HeadsArgs {
    #[command(flatten)]
    pub categories: FetchableCategoryFlags,
}

impl HeadsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let biome = ctx.load()?;
        for remote in biome.remotes(&self.categories.categories()).await? {
            println!("{}", remote.head());
        }
        Ok(())
    }
}
