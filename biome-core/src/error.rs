//! Error types for gh-biome

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for biome operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for biome operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// libgit2 error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// The path is not a git repository
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The repository has never been initialized as a biome
    #[error("Biome config version not set in {}", .0.display())]
    SchemaVersionMissing(PathBuf),

    /// The repository uses a biome config schema this tool does not understand
    #[error("Unexpected biome config version, expected: {expected:?} was: {found:?}")]
    SchemaVersionMismatch { expected: String, found: String },

    /// A single owner reference could not be parsed
    #[error("Owner reference {0:?} invalid, valid format is [https://][<host>/]<name>")]
    InvalidOwner(String),

    /// One or more stored owner references could not be parsed
    #[error("Could not parse owners:\n{0}")]
    OwnerParse(ErrorList),

    /// One or more owners were rejected by the repository directory
    #[error("Could not validate owners:\n{0}")]
    OwnerValidation(ErrorList),

    /// One or more repositories could not be mapped to a remote
    #[error("Could not map repositories to remotes:\n{0}")]
    Remote(ErrorList),

    /// The remote name cannot be embedded in a refspec pattern
    #[error("Refspec pattern invalid for remote {remote}: {pattern:?}")]
    InvalidRefspec { remote: String, pattern: String },

    /// The config edit workflow exited before the helper called back
    #[error("{command} ended before the editor helper called back: {status}\n{output}")]
    HelperDidNotConnect {
        command: String,
        status: String,
        output: String,
    },

    /// The config file handed over by the helper could not be read or parsed
    #[error("Could not load config file {}: {message}", .path.display())]
    LoadFailed { path: PathBuf, message: String },

    /// The edited config could not be written back
    #[error("Could not save config file {}: {message}", .path.display())]
    SaveFailed { path: PathBuf, message: String },

    /// The caller's config transform failed; nothing was written
    #[error("Config edit callback failed: {0}")]
    TransformFailed(#[source] Box<Error>),

    /// A reference transaction was rejected
    #[error("Reference transaction failed: {message}\n{output}")]
    RefTransactionFailed { message: String, output: String },

    /// A remote query was made without any category
    #[error("At least one remote category must be requested")]
    EmptyCategorySelector,

    /// The operation hit its deadline or was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// A git subprocess failed
    #[error("Could not {command:?}: {message}")]
    Command { command: String, message: String },

    /// The repository directory service failed
    #[error("Could not query repositories for {owner}: {message}")]
    Directory { owner: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True if this error, or the transform error it wraps, is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::TransformFailed(inner) => inner.is_cancelled(),
            _ => false,
        }
    }
}

/// A batch of per-item failures reported together.
#[derive(Debug, Default)]
pub struct ErrorList(pub Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, otherwise the list wrapped by `wrap`.
    pub fn into_result(self, wrap: impl FnOnce(ErrorList) -> Error) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(wrap(self))
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_list_display_joins_lines() {
        let mut errs = ErrorList::new();
        errs.push(Error::InvalidOwner("a/b/c".to_string()));
        errs.push(Error::Other("boom".to_string()));

        let text = errs.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("a/b/c"));
        assert_eq!(lines[1], "boom");
    }

    #[test]
    fn test_empty_error_list_is_ok() {
        assert!(ErrorList::new().into_result(Error::OwnerParse).is_ok());
    }

    #[test]
    fn test_non_empty_error_list_wraps() {
        let mut errs = ErrorList::new();
        errs.push(Error::Other("nope".to_string()));
        let err = errs.into_result(Error::OwnerValidation).unwrap_err();
        assert!(matches!(err, Error::OwnerValidation(ref list) if list.len() == 1));
    }

    #[test]
    fn test_cancelled_through_transform() {
        let err = Error::TransformFailed(Box::new(Error::Cancelled));
        assert!(err.is_cancelled());
        assert!(!Error::EmptyCategorySelector.is_cancelled());
    }
}
