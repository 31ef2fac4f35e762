use serde::Deserialize;

use super::{MetadataHeaders, ProviderAdapter, build_url, decode_json, parse_endpoint};
use crate::data::{FileEntry, RepositoryId};
use crate::error::Result;

const DEFAULT_ENDPOINT: &str = "https://modelscope.cn";

/// ModelScope. Hashes come from the file listing; downloads are direct.
#[derive(Debug, Clone)]
pub struct ModelScope {
    endpoint: String,
}

impl Default for ModelScope {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl ModelScope {
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?.into(),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListingData {
    #[serde(default)]
    files: Vec<RepoFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RepoFile {
    path: String,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default, rename = "Type")]
    kind: String,
}

impl ProviderAdapter for ModelScope {
    fn name(&self) -> &'static str {
        "ModelScope"
    }

    fn file_url(&self, repo: &RepositoryId, revision: &str, relative_path: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &["api", "v1", "models", repo.namespace(), repo.name(), "repo"],
            None,
            &[("Revision", revision), ("FilePath", relative_path)],
        )
    }

    fn listing_url(&self, repo: &RepositoryId, revision: &str) -> Result<String> {
        build_url(
            &self.endpoint,
            &["api", "v1", "models", repo.namespace(), repo.name(), "repo", "files"],
            None,
            &[("Revision", revision), ("Recursive", "true")],
        )
    }

    fn decode_listing(&self, body: &[u8]) -> Result<Vec<FileEntry>> {
        let listing: Listing = decode_json(self.name(), body)?;
        Ok(listing
            .data
            .files
            .into_iter()
            .filter(|file| file.kind != "tree")
            .map(|file| {
                let entry = FileEntry::new(file.path, file.size);
                match file.sha256.filter(|h| !h.is_empty()) {
                    Some(hash) => entry.with_hash(hash),
                    None => entry,
                }
            })
            .collect())
    }

    fn metadata_headers(&self) -> MetadataHeaders {
        MetadataHeaders::default()
    }
}
