use serde::Deserialize;

use super::{MetadataHeaders, ProviderAdapter, build_url, decode_json, parse_endpoint};
use crate::data::{FileEntry, RepositoryId};
use crate::error::Result;

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// HuggingFace Hub.
///
/// File URLs redirect to a CDN; the `x-linked-*` headers on the redirect
/// describe the file itself, while `ETag` on the CDN answer may not.
#[derive(Debug, Clone)]
pub struct HuggingFace {
    endpoint: String,
}

impl Default for HuggingFace {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl HuggingFace {
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?.into(),
        })
    }
}

#[derive(Deserialize)]
struct ModelInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Deserialize)]
struct Sibling {
    rfilename: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    lfs: Option<Lfs>,
}

#[derive(Deserialize)]
struct Lfs {
    sha256: String,
    size: u64,
}

impl ProviderAdapter for HuggingFace {
    fn name(&self) -> &'static str {
        "HuggingFace"
    }

    fn file_url(&self, repo: &RepositoryId, revision: &str, relative_path: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &[repo.namespace(), repo.name(), "resolve", revision],
            Some(relative_path),
            &[],
        )
    }

    fn listing_url(&self, repo: &RepositoryId, revision: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &["api", "models", repo.namespace(), repo.name(), "revision", revision],
            None,
            &[("blobs", "true")],
        )
    }

    fn decode_listing(&self, body: &[u8]) -> Result<Vec<FileEntry>> {
        let info: ModelInfo = decode_json(self.name(), body)?;
        Ok(info
            .siblings
            .into_iter()
            .map(|sibling| match sibling.lfs {
                Some(lfs) => FileEntry::new(sibling.rfilename, lfs.size).with_hash(lfs.sha256),
                None => FileEntry::new(sibling.rfilename, sibling.size.unwrap_or(0)),
            })
            .collect())
    }

    fn metadata_headers(&self) -> MetadataHeaders {
        MetadataHeaders {
            hash: Some("x-linked-etag"),
            size: Some("x-linked-size"),
            revision: Some("x-repo-commit"),
        }
    }
}
