//! The biome: one bare git repository aggregating every repository of a set
//! of GitHub owners as remotes
//!
//! All persistent state lives in the repository's local git config and is
//! only changed through [`Editor`] sessions. Reference changes that follow a
//! config change go through a single [`RefTransaction`] each.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::{RepositoryDescriptor, RepositoryDirectory};
use crate::error::ErrorList;
use crate::git::{
    self, dangling_symrefs, query_refs, Editor, EditorOptions, GitConfig, Outcome, RefCommand, RefEntry,
    RefTransaction, SCHEMA_VERSION,
};
use crate::owner::Owner;
use crate::remote::{Remote, RemoteCategory, RemoteConfig};
use crate::{Error, Result};

const VERSION_KEY: &str = "biome.version";
const OWNERS_KEY: &str = "biome.owners";
const FETCH_PARALLEL_KEY: &str = "fetch.parallel";

/// `biome.remotes.<category>`: remote names per category
fn category_key(category: RemoteCategory) -> String {
    format!("biome.remotes.{}", category.as_str())
}

/// `remotes.<group>`: git remote groups, one per owner
fn group_key(group: &str) -> String {
    format!("remotes.{}", group)
}

/// `remote.<name>.<option>`: git remotes
fn remote_key(name: &str, option: &str) -> String {
    format!("remote.{}.{}", name, option)
}

/// How a biome handle is opened or created
#[derive(Debug, Clone, Default)]
pub struct BiomeOptions {
    pub editor: EditorOptions,

    /// Run `git maintenance start` when a biome is created
    pub start_maintenance: bool,
}

/// Remote and reference changes decided by one reconciliation
#[derive(Debug, Default, PartialEq, Eq)]
struct Reconciliation {
    /// Fetchable remotes now configured, by name
    configured: Vec<RemoteConfig>,
    /// Previously configured remotes that are gone
    stale: Vec<String>,
}

/// A handle on an initialized biome
#[derive(Clone)]
pub struct Biome {
    path: PathBuf,
    editor: Editor,
    directory: Arc<dyn RepositoryDirectory>,
}

impl std::fmt::Debug for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Biome")
            .field("path", &self.path)
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

impl Biome {
    fn new(path: PathBuf, directory: Arc<dyn RepositoryDirectory>, options: &BiomeOptions) -> Self {
        Self {
            editor: Editor::new(path.clone(), options.editor.clone()),
            path,
            directory,
        }
    }

    /// Create a biome at `path`, or open the one already there.
    ///
    /// A missing repository is created bare. An existing repository without a
    /// biome schema version is adopted. A repository with any other schema
    /// version is refused.
    pub async fn init(
        path: impl Into<PathBuf>,
        directory: Arc<dyn RepositoryDirectory>,
        options: BiomeOptions,
    ) -> Result<Self> {
        let path = path.into();
        match git::validate(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Biome already initialized");
                return Ok(Self::new(path, directory, &options));
            }
            Err(Error::NotARepository(_)) => git::init_bare(&path)?,
            Err(Error::SchemaVersionMissing(_)) => {
                info!(path = %path.display(), "Adopting existing repository as a biome");
            }
            Err(e) => return Err(e),
        }

        let biome = Self::new(path, directory, &options);
        biome
            .editor
            .edit(|mut config| async move {
                write_schema(&mut config)?;
                Ok(Outcome::Save(config, ()))
            })
            .await
            .map_err(unwrap_transform)?;

        if options.start_maintenance {
            git::start_maintenance(&biome.path).await?;
        }

        info!(path = %biome.path.display(), "Initialized biome");
        Ok(biome)
    }

    /// Open an existing biome at `path`
    pub fn load(
        path: impl Into<PathBuf>,
        directory: Arc<dyn RepositoryDirectory>,
        options: BiomeOptions,
    ) -> Result<Self> {
        let path = path.into();
        git::validate(&path)?;
        Ok(Self::new(path, directory, &options))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record owners as members of the biome.
    ///
    /// Every owner is checked with the repository directory first; if any is
    /// rejected nothing is written.
    pub async fn add_owners(&self, owners: &[Owner]) -> Result<()> {
        let mut errors = ErrorList::new();
        for owner in owners {
            if let Err(e) = self.directory.validate_owner(owner).await {
                errors.push(e);
            }
        }
        errors.into_result(Error::OwnerValidation)?;

        let count = owners.len();
        let owners = owners.to_vec();
        self.editor
            .edit(|mut config| async move {
                add_owner_entries(&mut config, &owners)?;
                Ok(Outcome::Save(config, ()))
            })
            .await
            .map_err(unwrap_transform)?;

        info!(count, "Added owners");
        Ok(())
    }

    /// Forget owners. Owners that were never added are ignored.
    pub async fn remove_owners(&self, owners: &[Owner]) -> Result<()> {
        let owners = owners.to_vec();
        self.editor
            .edit(|mut config| async move {
                remove_owner_entries(&mut config, &owners)?;
                Ok(Outcome::Save(config, ()))
            })
            .await
            .map_err(unwrap_transform)
    }

    /// Owners currently in the biome, sorted
    pub async fn owners(&self) -> Result<Vec<Owner>> {
        self.editor
            .edit(|config| async move { Ok(Outcome::Keep(parse_owners(&config)?)) })
            .await
            .map_err(unwrap_transform)
    }

    /// Rebuild the remote configuration from the owners' current
    /// repositories, then bring HEAD references in line and drop the
    /// references of remotes that disappeared.
    pub async fn update_remotes(&self) -> Result<()> {
        let directory = Arc::clone(&self.directory);
        let plan = self
            .editor
            .edit(|mut config| async move {
                let owners = parse_owners(&config)?;
                let mut listings = Vec::with_capacity(owners.len());
                for owner in owners {
                    let repos = directory.list_repositories(&owner).await?;
                    debug!(owner = %owner, repos = repos.len(), "Listed repositories");
                    listings.push((owner, repos));
                }
                let plan = reconcile(&mut config, &listings)?;
                Ok(Outcome::Save(config, plan))
            })
            .await
            .map_err(unwrap_transform)?;

        info!(
            configured = plan.configured.len(),
            stale = plan.stale.len(),
            "Updated remote configuration"
        );

        let heads = head_patterns(&plan.configured);
        let existing = self.existing_refs(&heads, &heads).await?;
        self.apply(head_commands(&plan.configured, &existing)).await?;

        let stale: Vec<Remote> = plan
            .stale
            .iter()
            .map(|name| Remote::new(name.as_str()))
            .collect();
        let patterns: Vec<String> = stale.iter().map(Remote::namespace).collect();
        let stale_heads: Vec<String> = stale.iter().map(Remote::head).collect();
        let stale_refs = self.existing_refs(&patterns, &stale_heads).await?;
        self.apply(stale_commands(&stale_refs)).await?;

        Ok(())
    }

    /// Remotes filed under any of the given categories, sorted by name
    pub async fn remotes(&self, categories: &[RemoteCategory]) -> Result<Vec<Remote>> {
        if categories.is_empty() {
            return Err(Error::EmptyCategorySelector);
        }
        let categories = categories.to_vec();
        self.editor
            .edit(|config| async move { Ok(Outcome::Keep(select_remotes(&config, &categories)?)) })
            .await
            .map_err(unwrap_transform)
    }

    /// Fetch the remotes of the given owners, or of every owner when none are
    /// given
    pub async fn fetch(&self, owners: &[Owner]) -> Result<()> {
        let groups: Vec<String> = owners.iter().map(Owner::remote_group).collect();
        git::fetch(&self.path, &groups).await
    }

    /// References matching `patterns`, plus any of the symbolic `heads` left
    /// dangling
    async fn existing_refs(&self, patterns: &[String], heads: &[String]) -> Result<Vec<RefEntry>> {
        let mut refs = query_refs(&self.path, patterns).await?;
        for entry in dangling_symrefs(&self.path, heads)? {
            if !refs.iter().any(|listed| listed.name == entry.name) {
                refs.push(entry);
            }
        }
        Ok(refs)
    }

    /// Commit `commands` as one reference transaction; nothing to do is a no-op
    async fn apply(&self, commands: Vec<RefCommand>) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }
        let mut tx = RefTransaction::open(&self.path).await?;
        for command in commands {
            tx.push(command).await?;
        }
        debug!(commands = tx.len(), "Committing reference updates");
        tx.commit().await
    }
}

/// Surface the error our own transform raised rather than its wrapper
fn unwrap_transform(err: Error) -> Error {
    match err {
        Error::TransformFailed(inner) => *inner,
        other => other,
    }
}

fn write_schema(config: &mut GitConfig) -> Result<()> {
    config.set(VERSION_KEY, SCHEMA_VERSION)?;
    // let git pick how many remotes to fetch in parallel
    config.set(FETCH_PARALLEL_KEY, "0")
}

fn stored_owner_entries(config: &GitConfig) -> Result<BTreeSet<String>> {
    Ok(config.get_all(OWNERS_KEY)?.into_iter().collect())
}

fn write_owner_entries(config: &mut GitConfig, entries: BTreeSet<String>) -> Result<()> {
    config.unset_all(OWNERS_KEY)?;
    for entry in entries {
        config.add(OWNERS_KEY, &entry)?;
    }
    Ok(())
}

fn add_owner_entries(config: &mut GitConfig, owners: &[Owner]) -> Result<()> {
    let mut entries = stored_owner_entries(config)?;
    entries.extend(owners.iter().map(Owner::to_string));
    write_owner_entries(config, entries)
}

fn remove_owner_entries(config: &mut GitConfig, owners: &[Owner]) -> Result<()> {
    let mut entries = stored_owner_entries(config)?;
    for owner in owners {
        entries.remove(&owner.to_string());
    }
    write_owner_entries(config, entries)
}

/// Parse every stored owner, reporting all malformed entries at once
fn parse_owners(config: &GitConfig) -> Result<Vec<Owner>> {
    let mut owners = BTreeSet::new();
    let mut errors = ErrorList::new();
    for entry in config.get_all(OWNERS_KEY)? {
        match Owner::parse(&entry) {
            Ok(owner) => {
                owners.insert(owner);
            }
            Err(e) => errors.push(e),
        }
    }
    errors.into_result(Error::OwnerParse)?;
    Ok(owners.into_iter().collect())
}

/// Names of every remote with a url
fn declared_remotes(config: &GitConfig) -> Result<BTreeSet<String>> {
    Ok(config
        .names(r"^remote\..*\.url$")?
        .iter()
        .filter_map(|key| key.strip_prefix("remote.")?.strip_suffix(".url"))
        .map(str::to_string)
        .collect())
}

/// Rewrite remote declarations, owner groups and category memberships from
/// the listed repositories.
///
/// Every remote configured before this call that is not fetchable afterwards
/// is reported as stale.
fn reconcile(
    config: &mut GitConfig,
    listings: &[(Owner, Vec<RepositoryDescriptor>)],
) -> Result<Reconciliation> {
    let mut candidates = declared_remotes(config)?;

    let mut categories: BTreeMap<RemoteCategory, BTreeSet<String>> = BTreeMap::new();
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut configured: BTreeMap<String, RemoteConfig> = BTreeMap::new();
    let mut errors = ErrorList::new();

    for (owner, repos) in listings {
        for repo in repos {
            let remote_config = match RemoteConfig::from_repository(repo) {
                Ok(remote_config) => remote_config,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            let name = remote_config.remote.name.clone();
            let category = remote_config.remote.category();
            categories.entry(category).or_default().insert(name.clone());
            if category.is_fetchable() {
                groups
                    .entry(owner.remote_group())
                    .or_default()
                    .insert(name.clone());
                configured.insert(name, remote_config);
            }
        }
    }
    errors.into_result(Error::Remote)?;

    let mut refspecs = Vec::with_capacity(configured.len());
    for remote_config in configured.values() {
        refspecs.push(remote_config.remote.fetch_refspec()?);
    }

    config.unset_matching(r"^remote\.")?;
    config.unset_matching(r"^remotes\.")?;
    config.unset_matching(r"^biome\.remotes\.")?;

    for ((name, remote_config), refspec) in configured.iter().zip(&refspecs) {
        config.set(&remote_key(name, "url"), &remote_config.remote.fetch_url())?;
        config.set(&remote_key(name, "fetch"), refspec)?;
        config.set(&remote_key(name, "tagOpt"), "--no-tags")?;
        candidates.remove(name);
    }

    for (group, names) in &groups {
        let key = group_key(group);
        for name in names {
            config.add(&key, name)?;
        }
    }

    for (category, names) in &categories {
        let key = category_key(*category);
        for name in names {
            config.add(&key, name)?;
        }
    }

    Ok(Reconciliation {
        configured: configured.into_values().collect(),
        stale: candidates.into_iter().collect(),
    })
}

/// Remotes under the requested categories, flags set from membership
fn select_remotes(config: &GitConfig, categories: &[RemoteCategory]) -> Result<Vec<Remote>> {
    let mut remotes: BTreeMap<String, Remote> = BTreeMap::new();
    let requested: BTreeSet<RemoteCategory> = categories.iter().copied().collect();
    for category in requested {
        for name in config.get_all(&category_key(category))? {
            let remote = remotes
                .entry(name.clone())
                .or_insert_with(|| Remote::new(name.as_str()));
            category.mark(remote);
        }
    }
    Ok(remotes.into_values().collect())
}

fn head_patterns(configured: &[RemoteConfig]) -> Vec<String> {
    configured.iter().map(|c| c.remote.head()).collect()
}

/// Commands moving each remote's HEAD to its desired target, skipping HEADs
/// already in place
fn head_commands(configured: &[RemoteConfig], existing: &[RefEntry]) -> Vec<RefCommand> {
    let current: HashMap<&str, Option<&str>> = existing
        .iter()
        .map(|entry| (entry.name.as_str(), entry.symref.as_deref()))
        .collect();

    let mut commands = Vec::new();
    for remote_config in configured {
        let head = remote_config.remote.head();
        let state = current.get(head.as_str()).copied();
        if remote_config.head.is_empty() {
            match state {
                Some(Some(_)) => commands.push(RefCommand::symref_delete(head).no_deref()),
                Some(None) => commands.push(RefCommand::delete(head).no_deref()),
                None => {}
            }
        } else if state != Some(Some(remote_config.head.as_str())) {
            commands.push(RefCommand::symref_update(head, remote_config.head.as_str()));
        }
    }
    commands
}

/// Commands deleting every listed reference
fn stale_commands(refs: &[RefEntry]) -> Vec<RefCommand> {
    refs.iter()
        .map(|entry| {
            if entry.is_symbolic() {
                RefCommand::symref_delete(entry.name.as_str()).no_deref()
            } else {
                RefCommand::delete(entry.name.as_str())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::BranchRef;
    use async_trait::async_trait;

    struct StubDirectory {
        known: Vec<String>,
    }

    #[async_trait]
    impl RepositoryDirectory for StubDirectory {
        async fn validate_owner(&self, owner: &Owner) -> Result<()> {
            if self.known.contains(&owner.to_string()) {
                Ok(())
            } else {
                Err(Error::Directory {
                    owner: owner.to_string(),
                    message: "not found".to_string(),
                })
            }
        }

        async fn list_repositories(&self, _owner: &Owner) -> Result<Vec<RepositoryDescriptor>> {
            Ok(Vec::new())
        }
    }

    fn stub_biome(known: &[&str]) -> Biome {
        let directory = StubDirectory {
            known: known.iter().map(|s| s.to_string()).collect(),
        };
        Biome::new(
            PathBuf::from("/nonexistent/biome"),
            Arc::new(directory),
            &BiomeOptions::default(),
        )
    }

    fn owner(s: &str) -> Owner {
        Owner::parse(s).unwrap()
    }

    fn empty_config() -> GitConfig {
        GitConfig::from_text("").unwrap()
    }

    /// Every entry, values in file order
    fn snapshot(config: &GitConfig) -> BTreeMap<String, Vec<String>> {
        config
            .names(".*")
            .unwrap()
            .into_iter()
            .map(|name| {
                let values = config.get_all(&name).unwrap();
                (name, values)
            })
            .collect()
    }

    fn get(config: &GitConfig, key: &str) -> Option<String> {
        config.get(key).unwrap()
    }

    fn repo(url: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            url: url.to_string(),
            default_branch: Some(BranchRef::head("main")),
            ..RepositoryDescriptor::default()
        }
    }

    /// github.com/acme with one repository in every category, plus one with
    /// no default branch
    fn acme_listing() -> Vec<(Owner, Vec<RepositoryDescriptor>)> {
        vec![(
            owner("acme"),
            vec![
                repo("https://github.com/acme/app"),
                RepositoryDescriptor {
                    archived: true,
                    ..repo("https://github.com/acme/old")
                },
                RepositoryDescriptor {
                    disabled: true,
                    ..repo("https://github.com/acme/broken")
                },
                RepositoryDescriptor {
                    locked: true,
                    ..repo("https://github.com/acme/moved")
                },
                repo("https://github.com/acme/.github"),
                RepositoryDescriptor {
                    default_branch: None,
                    ..repo("https://github.com/acme/empty")
                },
            ],
        )]
    }

    #[test]
    fn test_write_schema() {
        let mut config = GitConfig::from_text("[core]\n\tbare = true\n").unwrap();
        write_schema(&mut config).unwrap();
        assert_eq!(get(&config, "biome.version").as_deref(), Some("1"));
        assert_eq!(get(&config, "fetch.parallel").as_deref(), Some("0"));
        assert_eq!(get(&config, "core.bare").as_deref(), Some("true"));
    }

    #[test]
    fn test_owner_entries_are_sorted_and_unique() {
        let mut config = empty_config();
        add_owner_entries(&mut config, &[owner("kubernetes"), owner("cli")]).unwrap();
        add_owner_entries(
            &mut config,
            &[owner("https://github.com/cli"), owner("my.github.biz/foobar")],
        )
        .unwrap();
        assert_eq!(
            config.get_all("biome.owners").unwrap(),
            ["github.com/cli", "github.com/kubernetes", "my.github.biz/foobar"]
        );

        remove_owner_entries(&mut config, &[owner("kubernetes"), owner("nobody")]).unwrap();
        assert_eq!(
            config.get_all("biome.owners").unwrap(),
            ["github.com/cli", "my.github.biz/foobar"]
        );
        assert_eq!(
            parse_owners(&config).unwrap(),
            vec![owner("cli"), owner("my.github.biz/foobar")]
        );
    }

    #[test]
    fn test_parse_owners_aggregates_failures() {
        let config = GitConfig::from_text(
            "[biome]\n\towners = github.com/cli\n\towners = a/b/c\n\towners = https://x\n",
        )
        .unwrap();
        match parse_owners(&config) {
            Err(Error::OwnerParse(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_reconcile_acme() {
        let mut config = GitConfig::from_text(
            "[biome]\n\tversion = 1\n\towners = github.com/acme\n\
             [remote \"github.com/acme/gone\"]\n\turl = https://github.com/acme/gone.git\n\
             [remote \"github.com/acme/app\"]\n\turl = https://github.com/acme/app.git\n",
        )
        .unwrap();

        let plan = reconcile(&mut config, &acme_listing()).unwrap();

        let configured: Vec<&str> = plan
            .configured
            .iter()
            .map(|c| c.remote.name.as_str())
            .collect();
        assert_eq!(
            configured,
            ["github.com/acme/app", "github.com/acme/empty", "github.com/acme/old"]
        );
        assert_eq!(plan.stale, ["github.com/acme/gone"]);

        assert_eq!(
            get(&config, "remote.github.com/acme/app.url").as_deref(),
            Some("https://github.com/acme/app.git")
        );
        assert_eq!(
            get(&config, "remote.github.com/acme/app.fetch").as_deref(),
            Some("+refs/*:refs/remotes/github.com/acme/app/*")
        );
        assert_eq!(
            get(&config, "remote.github.com/acme/old.tagOpt").as_deref(),
            Some("--no-tags")
        );
        for unfetchable in ["gone", "broken", "moved", ".github"] {
            let key = format!("remote.github.com/acme/{}.url", unfetchable);
            assert!(get(&config, &key).is_none(), "{key}");
        }

        let group = owner("acme").remote_group();
        assert_eq!(
            config.get_all(&format!("remotes.{}", group)).unwrap(),
            ["github.com/acme/app", "github.com/acme/empty", "github.com/acme/old"]
        );

        let category = |c: &str| config.get_all(&format!("biome.remotes.{}", c)).unwrap();
        assert_eq!(category("active"), ["github.com/acme/app", "github.com/acme/empty"]);
        assert_eq!(category("archived"), ["github.com/acme/old"]);
        assert_eq!(category("disabled"), ["github.com/acme/broken"]);
        assert_eq!(category("locked"), ["github.com/acme/moved"]);
        assert_eq!(category("unsupported"), ["github.com/acme/.github"]);

        assert_eq!(get(&config, "biome.owners").as_deref(), Some("github.com/acme"));
    }

    #[test]
    fn test_reconcile_partitions_remotes() {
        let mut config = empty_config();
        reconcile(&mut config, &acme_listing()).unwrap();

        let mut seen = BTreeSet::new();
        for category in RemoteCategory::ALL {
            for name in config.get_all(&category_key(category)).unwrap() {
                assert!(seen.insert(name.clone()), "{name} in two categories");
                let declared = get(&config, &remote_key(&name, "url")).is_some();
                assert_eq!(declared, category.is_fetchable(), "{name}");
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut config = empty_config();
        reconcile(&mut config, &acme_listing()).unwrap();
        let first = snapshot(&config);

        let plan = reconcile(&mut config, &acme_listing()).unwrap();
        assert!(plan.stale.is_empty());
        assert_eq!(snapshot(&config), first);
    }

    #[test]
    fn test_reconcile_vanished_owner_leaves_stale() {
        let mut config = empty_config();
        reconcile(&mut config, &acme_listing()).unwrap();

        let plan = reconcile(&mut config, &[]).unwrap();
        assert!(plan.configured.is_empty());
        assert_eq!(
            plan.stale,
            ["github.com/acme/app", "github.com/acme/empty", "github.com/acme/old"]
        );
        assert!(config.names(r"^remote\.").unwrap().is_empty());
        assert!(config.names(r"^remotes\.").unwrap().is_empty());
        assert!(config.get_all("biome.remotes.active").unwrap().is_empty());
    }

    #[test]
    fn test_reconcile_mapping_failure_leaves_config() {
        let text = "[biome]\n\tversion = 1\n[remote \"github.com/acme/app\"]\n\turl = x\n";
        let mut config = GitConfig::from_text(text).unwrap();
        let listing = vec![(
            owner("acme"),
            vec![repo("https://github.com/acme/app"), repo("not a url"), repo("https://github.com")],
        )];

        match reconcile(&mut config, &listing) {
            Err(Error::Remote(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(config.text(), text);
    }

    #[test]
    fn test_select_remotes() {
        let mut config = empty_config();
        reconcile(&mut config, &acme_listing()).unwrap();

        let fetchable = select_remotes(&config, &RemoteCategory::FETCHABLE).unwrap();
        let names: Vec<&str> = fetchable.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["github.com/acme/app", "github.com/acme/empty", "github.com/acme/old"]
        );
        assert!(fetchable[2].archived);
        assert!(!fetchable[0].archived);

        let locked =
            select_remotes(&config, &[RemoteCategory::Locked, RemoteCategory::Locked]).unwrap();
        assert_eq!(locked.len(), 1);
        assert!(locked[0].locked);
        assert!(!locked[0].disabled);

        assert_eq!(select_remotes(&config, &RemoteCategory::ALL).unwrap().len(), 6);
    }

    #[test]
    fn test_head_commands() {
        let listing = acme_listing();
        let mut config = empty_config();
        let plan = reconcile(&mut config, &listing).unwrap();

        let existing = vec![
            // already correct
            RefEntry {
                name: "refs/remotes/github.com/acme/app/HEAD".to_string(),
                symref: Some("refs/remotes/github.com/acme/app/heads/main".to_string()),
            },
            // lost its default branch
            RefEntry {
                name: "refs/remotes/github.com/acme/empty/HEAD".to_string(),
                symref: Some("refs/remotes/github.com/acme/empty/heads/main".to_string()),
            },
        ];

        let commands = head_commands(&plan.configured, &existing);
        assert_eq!(
            commands,
            vec![
                RefCommand::symref_delete("refs/remotes/github.com/acme/empty/HEAD").no_deref(),
                RefCommand::symref_update(
                    "refs/remotes/github.com/acme/old/HEAD",
                    "refs/remotes/github.com/acme/old/heads/main"
                ),
            ]
        );

        let settled = vec![
            existing[0].clone(),
            RefEntry {
                name: "refs/remotes/github.com/acme/old/HEAD".to_string(),
                symref: Some("refs/remotes/github.com/acme/old/heads/main".to_string()),
            },
        ];
        assert!(head_commands(&plan.configured, &settled).is_empty());
    }

    #[test]
    fn test_stale_commands() {
        let refs = vec![
            RefEntry {
                name: "refs/remotes/github.com/acme/gone/HEAD".to_string(),
                symref: Some("refs/remotes/github.com/acme/gone/heads/main".to_string()),
            },
            RefEntry {
                name: "refs/remotes/github.com/acme/gone/heads/main".to_string(),
                symref: None,
            },
        ];
        assert_eq!(
            stale_commands(&refs),
            vec![
                RefCommand::symref_delete("refs/remotes/github.com/acme/gone/HEAD").no_deref(),
                RefCommand::delete("refs/remotes/github.com/acme/gone/heads/main"),
            ]
        );
    }

    #[tokio::test]
    async fn test_remotes_requires_a_category() {
        let biome = stub_biome(&[]);
        let err = biome.remotes(&[]).await.unwrap_err();
        assert!(matches!(err, Error::EmptyCategorySelector));
    }

    #[tokio::test]
    async fn test_add_owners_validates_every_owner_first() {
        let biome = stub_biome(&["github.com/acme"]);
        let err = biome
            .add_owners(&[owner("acme"), owner("ghost"), owner("my.github.biz/ghost")])
            .await
            .unwrap_err();
        match err {
            Error::OwnerValidation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.to_string().contains("github.com/ghost"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_transform() {
        let err = unwrap_transform(Error::TransformFailed(Box::new(Error::EmptyCategorySelector)));
        assert!(matches!(err, Error::EmptyCategorySelector));
        assert!(matches!(unwrap_transform(Error::Cancelled), Error::Cancelled));
    }
}
