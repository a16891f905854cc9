//! GitHub as the biome's repository directory

use async_trait::async_trait;
use biome_core::{Owner, RepositoryDescriptor, RepositoryDirectory};
use tracing::info;

use crate::{Error, GitHubClient};

fn directory_error(owner: &Owner, err: Error) -> biome_core::Error {
    biome_core::Error::Directory {
        owner: owner.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl RepositoryDirectory for GitHubClient {
    async fn validate_owner(&self, owner: &Owner) -> biome_core::Result<()> {
        match self.owner_exists(owner).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(directory_error(
                owner,
                Error::OwnerNotFound(owner.to_string()),
            )),
            Err(e) => Err(directory_error(owner, e)),
        }
    }

    async fn list_repositories(
        &self,
        owner: &Owner,
    ) -> biome_core::Result<Vec<RepositoryDescriptor>> {
        let repos = self
            .owner_repositories(owner)
            .await
            .map_err(|e| directory_error(owner, e))?;
        info!(owner = %owner, count = repos.len(), "Listed repositories");
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_names_owner() {
        let owner = Owner::parse("my.github.biz/foobar").unwrap();
        let err = directory_error(&owner, Error::OwnerNotFound(owner.to_string()));
        match &err {
            biome_core::Error::Directory { owner, message } => {
                assert_eq!(owner, "my.github.biz/foobar");
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
