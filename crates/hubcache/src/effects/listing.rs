use futures_util::TryStreamExt;
use tracing::debug;

use super::http::HttpClient;
use crate::core::is_success;
use crate::data::{FileEntry, RepositoryId};
use crate::error::{Error, Result};
use crate::provider::ProviderAdapter;

/// Fetch and decode the file listing of `repo` at `revision`.
///
/// A 4xx answer means the repository or revision does not exist.
pub async fn list_files<C: HttpClient>(
    client: &C,
    adapter: &dyn ProviderAdapter,
    repo: &RepositoryId,
    revision: &str,
    headers: &[(String, String)],
) -> Result<Vec<FileEntry>> {
    let url = adapter.listing_url(repo, revision)?;
    debug!(provider = adapter.name(), %url, "listing repository");

    let response = client
        .get(&url, headers)
        .await
        .map_err(|e| Error::Unreachable(format!("{url}: {e}")))?;
    let status = response.head.status;
    if (400..500).contains(&status) {
        return Err(Error::NotFound { url, status });
    }
    if !is_success(status) {
        return Err(Error::Transport { url, status });
    }

    let body: Vec<u8> = response
        .body
        .map_err(|e| Error::Unreachable(format!("{url}: {e}")))
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await?;

    let entries = adapter.decode_listing(&body)?;
    debug!(provider = adapter.name(), %repo, files = entries.len(), "listing decoded");
    Ok(entries)
}
