use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `{namespace}/{name}` of a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId {
    namespace: String,
    name: String,
}

impl RepositoryId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        for part in [&namespace, &name] {
            if !is_plain_segment(part) {
                return Err(Error::Terminal(format!(
                    "invalid repository id '{namespace}/{name}': expected '<namespace>/<name>'"
                )));
            }
        }
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding `blobs/`, `snapshots/` and `refs/` for this repository.
    pub fn folder_name(&self) -> String {
        format!("models--{}--{}", self.namespace, self.name)
    }
}

fn is_plain_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains(['/', '\\'])
        && !s.chars().any(char::is_control)
}

impl FromStr for RepositoryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Err(Error::Terminal(format!(
                "invalid repository id '{s}': expected '<namespace>/<name>'"
            ))),
        }
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One file advertised by a repository listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// `/`-separated path inside the repository.
    pub relative_path: String,
    pub expected_size: u64,
    /// Content hash as published by the provider's listing, if it has one.
    pub content_hash: Option<String>,
}

impl FileEntry {
    pub fn new(relative_path: impl Into<String>, expected_size: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            expected_size,
            content_hash: None,
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }
}

/// What a metadata probe learned about one remote file.
///
/// Never persisted: an upstream file may move between attempts, so this is
/// resolved again on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Download URL after redirect resolution.
    pub location: String,
    /// Normalized content hash; names the blob.
    pub content_hash: String,
    pub size: u64,
    /// Commit the revision resolved to, when the provider reports one.
    pub revision_id: Option<String>,
}
