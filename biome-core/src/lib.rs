//! Biome Core - Core library for git biomes
//!
//! A biome is a single bare git repository holding the objects and references
//! of every repository owned by a set of GitHub users and organizations, each
//! configured as its own remote. This crate keeps the remote configuration in
//! step with what the owners currently publish.

pub mod biome;
pub mod config;
pub mod directory;
pub mod error;
pub mod git;
pub mod owner;
pub mod remote;
pub mod secrets;

pub use biome::{Biome, BiomeOptions};
pub use config::Config;
pub use directory::{BranchRef, RepositoryDescriptor, RepositoryDirectory};
pub use error::{Error, ErrorList, Result};
pub use owner::Owner;
pub use remote::{Remote, RemoteCategory, RemoteConfig};
pub use secrets::Secrets;
