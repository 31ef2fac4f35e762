use std::path::PathBuf;
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use tracing::{debug, info};

use super::http::HttpClient;
use super::layout::CacheLayout;
use super::listing;
use super::lock::StagingLocks;
use super::orchestrator::FileDownloader;
use super::retry::with_retries;
use crate::core::{check_relative_path, check_revision};
use crate::data::{DownloadOptions, FileEntry, RepositoryId, RepositoryProgress};
use crate::error::{Error, Result};
use crate::provider::ProviderAdapter;

/// Downloads whole repositories, or single files, from one provider into a
/// cache root.
///
/// # Examples
///
/// ```no_run
/// use hubcache::{DownloadOptions, Downloader, Provider};
///
/// # async fn run() -> hubcache::Result<()> {
/// let downloader = Downloader::new(
///     "/var/cache/models",
///     Provider::HuggingFace.adapter(),
///     DownloadOptions::default().concurrency(4),
/// )?;
/// let repo = "acme/model".parse()?;
/// let path = downloader.download_repository(&repo, "main").await?;
/// println!("cached at {}", path.display());
/// # Ok(())
/// # }
/// ```
pub struct Downloader<C> {
    client: C,
    adapter: Arc<dyn ProviderAdapter>,
    layout: CacheLayout,
    locks: StagingLocks,
    options: DownloadOptions,
}

#[cfg(feature = "reqwest")]
impl Downloader<super::http::ReqwestClient> {
    /// A downloader using reqwest, configured from `options.timeouts`.
    pub fn new(
        cache_root: impl Into<PathBuf>,
        adapter: Arc<dyn ProviderAdapter>,
        options: DownloadOptions,
    ) -> Result<Self> {
        let client = super::http::ReqwestClient::new(options.timeouts)?;
        Ok(Self::with_client(client, cache_root, adapter, options))
    }
}

impl<C: HttpClient> Downloader<C> {
    pub fn with_client(
        client: C,
        cache_root: impl Into<PathBuf>,
        adapter: Arc<dyn ProviderAdapter>,
        options: DownloadOptions,
    ) -> Self {
        Self {
            client,
            adapter,
            layout: CacheLayout::new(cache_root),
            locks: StagingLocks::process_wide(),
            options,
        }
    }

    /// Use a private lock table instead of the process-wide one.
    #[must_use]
    pub fn with_locks(mut self, locks: StagingLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Download every file of `repo` at `revision`, then publish the
    /// repository link. Returns the link path.
    ///
    /// Stops at the first file that cannot be downloaded; files after it in
    /// listing order are not started and the link is not published.
    ///
    /// The link names the repository, not a revision. Once it exists this
    /// returns it for any `revision` without contacting the provider; call
    /// [`Downloader::delete_repository`] first to switch revisions.
    pub async fn download_repository(
        &self,
        repo: &RepositoryId,
        revision: &str,
    ) -> Result<PathBuf> {
        check_revision(revision)?;
        if self.layout.is_repository_published(repo) {
            debug!(%repo, "repository link already published");
            return Ok(self.layout.link_path(repo));
        }
        self.check_paused(repo)?;

        let entries = self.list_files(repo, revision).await?;
        let mut progress = RepositoryProgress {
            files_total: entries.len(),
            files_done: 0,
            bytes_total: entries.iter().map(|e| e.expected_size).sum(),
            bytes_done: 0,
        };
        info!(
            %repo,
            revision,
            files = progress.files_total,
            bytes = progress.bytes_total,
            "downloading repository"
        );
        self.options.report_repository(progress);

        let mut downloads = stream::iter(&entries)
            .map(|entry| async move {
                let result = match self.check_paused(repo) {
                    Ok(()) => self.fetch_with_retries(repo, revision, entry).await,
                    Err(e) => Err(e),
                };
                (entry, result)
            })
            .buffered(self.options.concurrency.max(1));

        while let Some((entry, result)) = downloads.next().await {
            match result {
                Ok(_) => {
                    progress.files_done += 1;
                    progress.bytes_done += entry.expected_size;
                    self.options.report_repository(progress);
                }
                Err(e @ Error::Paused(_)) => return Err(e),
                Err(e) => {
                    return Err(Error::PartialFailure {
                        path: entry.relative_path.clone(),
                        source: Box::new(e),
                    });
                }
            }
        }

        let link = self.layout.publish_repository(repo, revision)?;
        info!(%repo, revision, link = %link.display(), "repository cached");
        Ok(link)
    }

    /// Download a single file by path. Returns its pointer path.
    pub async fn download_file(
        &self,
        repo: &RepositoryId,
        revision: &str,
        relative_path: &str,
    ) -> Result<PathBuf> {
        check_relative_path(relative_path)?;
        let entry = FileEntry::new(relative_path, 0);
        self.fetch_with_retries(repo, revision, &entry).await
    }

    /// Download a single listed file; its listing hash and size are used
    /// when the provider's headers lack them.
    pub async fn download_entry(
        &self,
        repo: &RepositoryId,
        revision: &str,
        entry: &FileEntry,
    ) -> Result<PathBuf> {
        self.fetch_with_retries(repo, revision, entry).await
    }

    /// The provider's listing for `repo` at `revision`.
    pub async fn list_files(&self, repo: &RepositoryId, revision: &str) -> Result<Vec<FileEntry>> {
        let client = &self.client;
        let adapter = self.adapter.as_ref();
        let headers = &*self.options.headers;
        with_retries(self.options.retry, adapter.name(), move |_| {
            listing::list_files(client, adapter, repo, revision, headers)
        })
        .await
        .map_err(|e| Error::Listing {
            repo: repo.to_string(),
            source: Box::new(e),
        })
    }

    /// Whether the repository link is published.
    pub fn is_downloaded(&self, repo: &RepositoryId) -> bool {
        self.layout.is_repository_published(repo)
    }

    pub fn repository_path(&self, repo: &RepositoryId) -> PathBuf {
        self.layout.link_path(repo)
    }

    /// Total listed size of `repo` at `revision`, without downloading.
    pub async fn repository_size(&self, repo: &RepositoryId, revision: &str) -> Result<u64> {
        let entries = self.list_files(repo, revision).await?;
        Ok(entries.iter().map(|e| e.expected_size).sum())
    }

    /// Unpublish and remove everything cached for `repo`.
    ///
    /// Blobs hard-linked into other repositories stay readable there.
    pub fn delete_repository(&self, repo: &RepositoryId) -> Result<bool> {
        let removed = self.layout.remove_repository(repo)?;
        if removed {
            info!(%repo, "repository removed from cache");
        }
        Ok(removed)
    }

    async fn fetch_with_retries(
        &self,
        repo: &RepositoryId,
        revision: &str,
        entry: &FileEntry,
    ) -> Result<PathBuf> {
        let downloader = &FileDownloader {
            client: &self.client,
            adapter: self.adapter.as_ref(),
            layout: &self.layout,
            locks: &self.locks,
            options: &self.options,
        };
        with_retries(self.options.retry, self.adapter.name(), move |attempt| {
            downloader.download(repo, revision, entry, attempt)
        })
        .await
    }

    fn check_paused(&self, repo: &RepositoryId) -> Result<()> {
        let name = repo.to_string();
        if self.options.paused.is_paused(&name) {
            return Err(Error::Paused(name));
        }
        Ok(())
    }
}
