//! Provider dialects behind one adapter interface.
//!
//! Adapters only translate: they build URLs, name the metadata headers and
//! decode listing bodies. All network I/O lives in [`crate::effects`].

mod huggingface;
mod modelers;
mod modelscope;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use url::Url;

use crate::data::{FileEntry, RepositoryId};
use crate::error::{Error, Result};

pub use huggingface::HuggingFace;
pub use modelers::Modelers;
pub use modelscope::ModelScope;

/// Provider-specific header names preferred over the generic `ETag` and
/// `Content-Length`. Generic headers can describe a redirect target's
/// representation rather than the file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetadataHeaders {
    pub hash: Option<&'static str>,
    pub size: Option<&'static str>,
    pub revision: Option<&'static str>,
}

pub trait ProviderAdapter: Send + Sync + fmt::Debug {
    /// Human-readable name, used in errors and logs.
    fn name(&self) -> &'static str;

    fn file_url(&self, repo: &RepositoryId, revision: &str, relative_path: &str)
    -> Result<String>;

    fn listing_url(&self, repo: &RepositoryId, revision: &str) -> Result<String>;

    /// Decode a listing body into entries, in the provider's order.
    fn decode_listing(&self, body: &[u8]) -> Result<Vec<FileEntry>>;

    fn metadata_headers(&self) -> MetadataHeaders;
}

/// The supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    HuggingFace,
    ModelScope,
    Modelers,
}

impl Provider {
    /// Adapter talking to the provider's public endpoint.
    pub fn adapter(self) -> Arc<dyn ProviderAdapter> {
        match self {
            Provider::HuggingFace => Arc::new(HuggingFace::default()),
            Provider::ModelScope => Arc::new(ModelScope::default()),
            Provider::Modelers => Arc::new(Modelers::default()),
        }
    }

    /// Adapter talking to a mirror or test server instead.
    pub fn adapter_at(self, endpoint: &str) -> Result<Arc<dyn ProviderAdapter>> {
        Ok(match self {
            Provider::HuggingFace => Arc::new(HuggingFace::with_endpoint(endpoint)?),
            Provider::ModelScope => Arc::new(ModelScope::with_endpoint(endpoint)?),
            Provider::Modelers => Arc::new(Modelers::with_endpoint(endpoint)?),
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::HuggingFace => "HuggingFace",
            Provider::ModelScope => "ModelScope",
            Provider::Modelers => "Modelers",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Provider::HuggingFace),
            "modelscope" | "ms" => Ok(Provider::ModelScope),
            "modelers" | "ml" => Ok(Provider::Modelers),
            other => Err(Error::Terminal(format!("unknown provider '{other}'"))),
        }
    }
}

pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::Terminal(format!("invalid endpoint '{endpoint}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Terminal(format!("invalid endpoint '{endpoint}'")));
    }
    Ok(url)
}

/// Append path segments (each percent-encoded on its own) and query pairs to
/// `endpoint`. A `/` inside `tail` separates segments.
pub(crate) fn build_url(
    endpoint: &str,
    segments: &[&str],
    tail: Option<&str>,
    query: &[(&str, &str)],
) -> Result<String> {
    let mut url = parse_endpoint(endpoint)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| Error::Terminal(format!("invalid endpoint '{endpoint}'")))?;
        path.pop_if_empty().extend(segments);
        if let Some(tail) = tail {
            path.extend(tail.split('/'));
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

pub(crate) fn decode_json<'a, T: serde::Deserialize<'a>>(
    provider: &str,
    body: &'a [u8],
) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidResponse(format!("{provider} listing: {e}")))
}
