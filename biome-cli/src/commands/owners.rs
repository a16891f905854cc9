//! `biome add`, `biome remove` and `biome list`

use biome_core::Owner;
use clap::Args;

use super::Context;

/// Add every repository of GitHub users or organizations to the biome.
///
/// Owners are given as `[https://][<host>/]<name>`; `<host>` defaults to
/// github.com. Each repository becomes a git remote named
/// `<host>/<owner>/<repo>` whose references are fetched under
/// `refs/remotes/<host>/<owner>/<repo>/`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Owners to add
    #[arg(required = true, value_name = "OWNER")]
    pub owners: Vec<Owner>,

    /// Only configure remotes, do not fetch them
    #[arg(long)]
    pub skip_fetch: bool,
}

impl AddArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let biome = ctx.load()?;
        biome.add_owners(&self.owners).await?;

        eprintln!("Updating git remote configurations...");
        biome.update_remotes().await?;

        if !self.skip_fetch {
            biome.fetch(&self.owners).await?;
        }
        Ok(())
    }
}

/// Remove owners and the references of their repositories from the biome
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Owners to remove
    #[arg(required = true, value_name = "OWNER")]
    pub owners: Vec<Owner>,
}

impl RemoveArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let biome = ctx.load()?;
        for owner in &self.owners {
            eprintln!("Removing {}...", owner);
        }
        biome.remove_owners(&self.owners).await?;
        biome.update_remotes().await?;
        Ok(())
    }
}

/// Print the owners in the biome, one per line
pub async fn list(ctx: &Context) -> anyhow::Result<()> {
    let biome = ctx.load()?;
    for owner in biome.owners().await? {
        println!("{}", owner);
    }
    Ok(())
}
