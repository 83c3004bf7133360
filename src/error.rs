use std::path::PathBuf;
use thiserror::Error;

/// A reference could not be turned into a fetchable URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to parse resolved URL {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A single request failed. Per-resource failures are logged and skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum CloneError {
    #[error("page URL must start with http:// or https://, got {0:?}")]
    UnsupportedScheme(String),
    #[error("invalid page URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to fetch page {url}: {source}")]
    RootFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
