//! Remote category selection flags shared by `remotes` and `heads`

use biome_core::RemoteCategory;
use clap::Args;

/// Category flags for commands that can list any remote
#[derive(Args, Debug, Default, Clone)]
pub struct CategoryFlags {
    /// Include active remotes: not archived, disabled or locked on GitHub, and
    /// supported by this tool
    #[arg(long)]
    pub active: bool,

    /// Include remotes archived on GitHub
    #[arg(long)]
    pub archived: bool,

    /// Include remotes disabled on GitHub. Disabled repositories cannot be
    /// fetched and are never configured as git remotes.
    #[arg(long)]
    pub disabled: bool,

    /// Include remotes locked on GitHub, usually after a migration to another
    /// forge. Locked repositories cannot be fetched and are never configured
    /// as git remotes.
    #[arg(long)]
    pub locked: bool,

    /// Include remotes this tool cannot configure, recorded for reference
    #[arg(long)]
    pub unsupported: bool,

    /// Include every remote regardless of its status on GitHub
    #[arg(long)]
    pub all: bool,
}

impl CategoryFlags {
    pub fn categories(&self) -> Vec<RemoteCategory> {
        select(
            &RemoteCategory::ALL,
            self.all,
            &[
                (RemoteCategory::Active, self.active),
                (RemoteCategory::Archived, self.archived),
                (RemoteCategory::Disabled, self.disabled),
                (RemoteCategory::Locked, self.locked),
                (RemoteCategory::Unsupported, self.unsupported),
            ],
        )
    }
}

/// Category flags for commands limited to fetchable remotes
#[derive(Args, Debug, Default, Clone)]
pub struct FetchableCategoryFlags {
    /// Include active remotes
    #[arg(long)]
    pub active: bool,

    /// Include remotes archived on GitHub
    #[arg(long)]
    pub archived: bool,

    /// Include every fetchable remote
    #[arg(long)]
    pub all: bool,
}

impl FetchableCategoryFlags {
    pub fn categories(&self) -> Vec<RemoteCategory> {
        select(
            &RemoteCategory::FETCHABLE,
            self.all,
            &[
                (RemoteCategory::Active, self.active),
                (RemoteCategory::Archived, self.archived),
            ],
        )
    }
}

/// Active by default; any explicit flag replaces the default
fn select(
    allowed: &[RemoteCategory],
    all: bool,
    flags: &[(RemoteCategory, bool)],
) -> Vec<RemoteCategory> {
    if all {
        return allowed.to_vec();
    }
    let chosen: Vec<RemoteCategory> = flags
        .iter()
        .filter(|(_, set)| *set)
        .map(|(category, _)| *category)
        .collect();
    if chosen.is_empty() {
        vec![RemoteCategory::Active]
    } else {
        chosen
    }
}
