use serde::Deserialize;

use super::{MetadataHeaders, ProviderAdapter, build_url, decode_json, parse_endpoint};
use crate::data::{FileEntry, RepositoryId};
use crate::error::Result;

const DEFAULT_ENDPOINT: &str = "https://modelers.cn";

/// Modelers. Like ModelScope, the listing is the source of content hashes.
#[derive(Debug, Clone)]
pub struct Modelers {
    endpoint: String,
}

impl Default for Modelers {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Modelers {
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?.into(),
        })
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    etag: Option<String>,
    #[serde(default, rename = "type")]
    kind: String,
}

impl ProviderAdapter for Modelers {
    fn name(&self) -> &'static str {
        "Modelers"
    }

    fn file_url(&self, repo: &RepositoryId, revision: &str, relative_path: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &[
                "coderepo",
                "web",
                "v1",
                "file",
                repo.namespace(),
                repo.name(),
                revision,
                "media",
            ],
            Some(relative_path),
            &[],
        )
    }

    fn listing_url(&self, repo: &RepositoryId, revision: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &["api", "v1", "file", repo.namespace(), repo.name()],
            None,
            &[("ref", revision), ("recursive", "true")],
        )
    }

    fn decode_listing(&self, body: &[u8]) -> Result<Vec<FileEntry>> {
        let listing: Listing = decode_json(self.name(), body)?;
        Ok(listing
            .data
            .tree
            .into_iter()
            .filter(|entry| entry.kind != "dir" && entry.kind != "tree")
            .map(|entry| {
                let hash = entry
                    .sha256
                    .filter(|h| !h.is_empty())
                    .or(entry.etag.filter(|h| !h.is_empty()));
                let file = FileEntry::new(entry.path, entry.size);
                match hash {
                    Some(hash) => file.with_hash(hash),
                    None => file,
                }
            })
            .collect())
    }

    fn metadata_headers(&self) -> MetadataHeaders {
        MetadataHeaders::default()
    }
}
