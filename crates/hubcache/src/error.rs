//! Error types for hubcache.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No response at all: DNS, connect, TLS or a dropped stream.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The server answered, but without what blob addressing needs.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("not found ({status}): {url}")]
    NotFound { url: String, status: u16 },

    #[error("HTTP error {status} while transferring {url}")]
    Transport { url: String, status: u16 },

    #[error("filesystem error: {0}")]
    Filesystem(#[from] hubcache_fs::Error),

    #[error("content verification failed for '{path}': {source}")]
    Verification {
        path: PathBuf,
        #[source]
        source: hubcache_verify::VerifyError,
    },

    #[error("size mismatch for '{path}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("failed to list {repo}: {source}")]
    Listing {
        repo: String,
        #[source]
        source: Box<Error>,
    },

    #[error("download of '{path}' failed: {source}")]
    PartialFailure {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{provider}: gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        provider: &'static str,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Not worth retrying, e.g. a malformed repository id or path.
    #[error("{0}")]
    Terminal(String),

    #[error("download of {0} is paused")]
    Paused(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem(hubcache_fs::Error::Write {
            path: path.into(),
            source,
        })
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Terminal(_) | Self::Paused(_) => false,
            Self::RetriesExhausted { .. } => false,
            Self::Listing { source, .. } | Self::PartialFailure { source, .. } => {
                source.is_retryable()
            }
            _ => true,
        }
    }

    /// Number of attempts made, when the error came out of a retry loop that
    /// ran to exhaustion.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            Self::PartialFailure { source, .. } => source.attempts(),
            _ => None,
        }
    }

    /// The innermost error, past listing/partial/retry wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Listing { source, .. }
            | Self::PartialFailure { source, .. }
            | Self::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
