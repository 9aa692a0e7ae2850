//! Error types.
//!
//! Construction problems surface as [`ConfigError`], store failures as
//! [`StoreError`], and mutation failures as [`ApplyError`]. Everything
//! rolls up into [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store answered, but some requested paths were absent.
    #[error("parameters not found: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Invalid replacer configuration. Raised before any store request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("prefix must be non-empty")]
    EmptyPrefix,

    #[error("file path must be non-empty")]
    EmptyFilePath,

    #[error("failed to stat {}: {source}", .path.display())]
    FileStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by, or while talking to, the parameter store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("parameter store request failed: {0}")]
    Request(String),

    #[error("parameter store request cancelled")]
    Cancelled,

    #[error("batch task failed: {0}")]
    TaskFailed(String),
}

/// Failures while writing resolved values back.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("failed to set {name}: {reason}")]
    SetVar { name: String, reason: String },

    #[error("failed to unset {name}: {reason}")]
    RemoveVar { name: String, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_every_path() {
        let err = Error::NotFound(vec!["/a".into(), "/b".into()]);
        assert_eq!(err.to_string(), "parameters not found: /a, /b");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: Error = StoreError::Request("throttled".into()).into();
        assert_eq!(
            err.to_string(),
            "parameter store request failed: throttled"
        );
    }

    #[test]
    fn test_not_found_differs_from_store_failure() {
        let missing = Error::NotFound(vec!["/a".into()]).to_string();
        let failed = Error::from(StoreError::Request("/a".into())).to_string();
        assert_ne!(missing, failed);
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            Error::from(ConfigError::EmptyPrefix).to_string(),
            "prefix must be non-empty"
        );
        assert_eq!(
            Error::from(ConfigError::EmptyFilePath).to_string(),
            "file path must be non-empty"
        );
    }
}
