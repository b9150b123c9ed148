//! Error taxonomy shared by the library.
//!
//! The CLI wraps these in `anyhow` with extra context; library callers can
//! match on the variant to tell a malformed document from a missing token or
//! a failed HTTP call.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A metadata document is malformed (missing or misplaced delimiter,
    /// front matter that is not a mapping, missing `id`).
    #[error("format error in {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// A required setting or credential is absent or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-success HTTP status or undecodable body from an external service.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// One or more integrity checks failed.
    #[error("{count} integrity check failure(s)")]
    Assertion { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Error::transport(url, err.to_string())
    }
}
