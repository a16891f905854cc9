//! GitHub GraphQL API client

use std::collections::HashMap;

use biome_core::owner::DEFAULT_HOST;
use biome_core::Secrets;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("gh-biome/", env!("CARGO_PKG_VERSION"));

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

/// GitHub API client covering github.com and GitHub Enterprise servers.
///
/// Each request is authenticated with the token configured for the host it
/// targets.
pub struct GitHubClient {
    http: reqwest::Client,
    secrets: Secrets,
    /// Per-host endpoint overrides
    endpoints: HashMap<String, Url>,
}

impl GitHubClient {
    /// Create a client using the given credentials
    pub fn new(secrets: Secrets) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            secrets,
            endpoints: HashMap::new(),
        })
    }

    /// Create a client with credentials from the environment and
    /// `~/.config/biome/secrets.toml`
    pub fn from_env() -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;
        info!("Created GitHub client");
        Self::new(secrets)
    }

    /// Send queries for `host` to `endpoint` instead of the default
    pub fn with_endpoint(mut self, host: &str, endpoint: Url) -> Self {
        self.endpoints.insert(host.to_lowercase(), endpoint);
        self
    }

    /// GraphQL endpoint serving `host`
    pub fn endpoint(&self, host: &str) -> Result<Url> {
        if let Some(endpoint) = self.endpoints.get(&host.to_lowercase()) {
            return Ok(endpoint.clone());
        }
        default_endpoint(host)
    }

    /// Execute a GraphQL query against `host`
    pub(crate) async fn graphql_query<T: DeserializeOwned>(
        &self,
        host: &str,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        let url = self.endpoint(host)?;
        let token = self.secrets.token(host).ok_or_else(|| {
            Error::Auth(format!(
                "No token for {}. Set {} or add it to ~/.config/biome/secrets.toml",
                host,
                if host.eq_ignore_ascii_case(DEFAULT_HOST) {
                    "GH_TOKEN"
                } else {
                    "GH_ENTERPRISE_TOKEN"
                }
            ))
        })?;

        debug!(url = %url, "Sending GraphQL query");
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(match status.as_u16() {
                401 => Error::Auth(format!("Invalid token for {}", host)),
                code => Error::Status { status: code, body },
            });
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// github.com is served from api.github.com; Enterprise servers serve the API
/// under `/api/graphql` on their own host.
fn default_endpoint(host: &str) -> Result<Url> {
    let host = host.to_lowercase();
    let url = if host == DEFAULT_HOST {
        "https://api.github.com/graphql".to_string()
    } else {
        format!("https://{}/api/graphql", host)
    };
    Ok(Url::parse(&url)?)
}

fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    let response: GraphQLResponse<T> = serde_json::from_str(text)
        .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(Error::GraphQL(messages.join(", ")));
    }

    response
        .data
        .ok_or_else(|| Error::Parse("GraphQL response missing data".to_string()))
}
