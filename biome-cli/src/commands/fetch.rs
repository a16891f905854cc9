//! `biome fetch`

use anyhow::bail;
use biome_core::{Biome, Owner};
use clap::Args;

use super::Context;

/// Refresh remote configurations and fetch the remotes of the given owners,
/// or of every owner when none are given
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Owners to fetch; each must already be in the biome
    #[arg(value_name = "OWNER")]
    pub owners: Vec<Owner>,
}

impl FetchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let biome = ctx.load()?;
        ensure_present(&biome, &self.owners).await?;

        eprintln!("Updating git remote configurations...");
        biome.update_remotes().await?;

        biome.fetch(&self.owners).await?;
        Ok(())
    }
}

/// Fail naming every requested owner that was never added
async fn ensure_present(biome: &Biome, owners: &[Owner]) -> anyhow::Result<()> {
    if owners.is_empty() {
        return Ok(());
    }
    let present = biome.owners().await?;
    let missing = missing_owners(&present, owners);
    if !missing.is_empty() {
        bail!("Owners were not added to the biome: {}", missing.join(", "));
    }
    Ok(())
}

fn missing_owners(present: &[Owner], requested: &[Owner]) -> Vec<String> {
    requested
        .iter()
        .filter(|owner| !present.contains(owner))
        .map(Owner::to_string)
        .collect()
}
