//! Owner and repository queries

use biome_core::{Owner, RepositoryDescriptor};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Error, GitHubClient, Result};

const OWNER_QUERY: &str = "query Owner($owner:String!){repositoryOwner(login: $owner){id}}";

const REPOSITORIES_QUERY: &str = "query OwnerRepositories($endCursor:String$owner:String!)\
{repositoryOwner(login: $owner){repositories(first: 100, after: $endCursor, affiliations: [OWNER])\
{nodes{isDisabled,isArchived,isLocked,url,defaultBranchRef{name,prefix}},\
pageInfo{hasNextPage,endCursor}}}}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerData {
    repository_owner: Option<OwnerId>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OwnerId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoriesData {
    repository_owner: Option<OwnerRepositories>,
}

#[derive(Debug, Deserialize)]
struct OwnerRepositories {
    repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    nodes: Vec<RepositoryDescriptor>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl RepositoriesData {
    /// This page's repositories and the cursor of the next page, if any
    fn into_page(self, owner: &Owner) -> Result<(Vec<RepositoryDescriptor>, Option<String>)> {
        let connection = self
            .repository_owner
            .ok_or_else(|| Error::OwnerNotFound(owner.to_string()))?
            .repositories;
        let next = if connection.page_info.has_next_page {
            let cursor = connection.page_info.end_cursor.ok_or_else(|| {
                Error::Parse("Next page announced without an end cursor".to_string())
            })?;
            Some(cursor)
        } else {
            None
        };
        Ok((connection.nodes, next))
    }
}

impl GitHubClient {
    /// Check that a user or organization exists on its host
    pub async fn owner_exists(&self, owner: &Owner) -> Result<bool> {
        debug!(owner = %owner, "Looking up owner");
        let data: OwnerData = self
            .graphql_query(owner.host(), OWNER_QUERY, &json!({ "owner": owner.name() }))
            .await?;
        Ok(data.repository_owner.is_some())
    }

    /// Every repository the owner owns, following pagination
    pub async fn owner_repositories(&self, owner: &Owner) -> Result<Vec<RepositoryDescriptor>> {
        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let variables = json!({
                "owner": owner.name(),
                "endCursor": cursor,
            });
            let data: RepositoriesData = self
                .graphql_query(owner.host(), REPOSITORIES_QUERY, &variables)
                .await?;
            let (page, next) = data.into_page(owner)?;
            debug!(owner = %owner, page = page.len(), "Fetched repository page");
            repos.extend(page);

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(repos)
    }
}
