//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error talking to the GitHub API
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// The API answered with a non-success status
    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL query itself failed
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// The owner does not exist on its host
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Parse(format!("Invalid API URL: {}", err))
    }
}
