//! Biome GitHub - GitHub integration for gh-biome
//!
//! Looks up GitHub users and organizations and lists their repositories
//! through the GraphQL API, on github.com and GitHub Enterprise servers.

mod client;
mod directory;
mod error;
mod graphql;

pub use client::GitHubClient;
pub use error::{Error, Result};
