use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use hubcache_verify::{Hasher, Sha256Hasher, expect_hex, is_sha256_hex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::http::HttpClient;
use super::layout::{CacheLayout, RepoLayout};
use super::lock::StagingLocks;
use super::metadata::MetadataResolver;
use crate::core::{check_relative_path, check_revision, is_success};
use crate::data::{DownloadOptions, FetchPhase, FileEntry, FileMetadata, Progress, RepositoryId};
use crate::error::{Error, Result};
use crate::provider::ProviderAdapter;

const RANGE_NOT_SATISFIABLE: u16 = 416;
const READ_BUFFER: usize = 64 * 1024;

/// Downloads one file into the cache and publishes its pointer.
pub struct FileDownloader<'a, C> {
    pub(crate) client: &'a C,
    pub(crate) adapter: &'a dyn ProviderAdapter,
    pub(crate) layout: &'a CacheLayout,
    pub(crate) locks: &'a StagingLocks,
    pub(crate) options: &'a DownloadOptions,
}

/// Where one attempt stands, for progress reports.
struct Attempt<'a> {
    repo: String,
    path: &'a str,
    number: u32,
}

impl<C: HttpClient> FileDownloader<'_, C> {
    /// One attempt at `entry`. Returns the pointer path.
    ///
    /// A published pointer short-circuits before any request is sent.
    pub async fn download(
        &self,
        repo: &RepositoryId,
        revision: &str,
        entry: &FileEntry,
        attempt: u32,
    ) -> Result<PathBuf> {
        check_revision(revision)?;
        check_relative_path(&entry.relative_path)?;

        let repo_layout = self.layout.repo(repo);
        let pointer = repo_layout.pointer_path(revision, &entry.relative_path);
        let attempt = Attempt {
            repo: repo.to_string(),
            path: &entry.relative_path,
            number: attempt,
        };

        if repo_layout.is_published(&pointer) {
            debug!(%repo, path = %entry.relative_path, "pointer already published");
            self.report(&attempt, FetchPhase::Completed, entry.expected_size, entry.expected_size);
            return Ok(pointer);
        }
        self.check_paused(&attempt)?;

        self.report(&attempt, FetchPhase::Resolving, 0, entry.expected_size);
        let url = self
            .adapter
            .file_url(repo, revision, &entry.relative_path)?;
        let metadata = MetadataResolver::new(
            self.client,
            self.adapter.metadata_headers(),
            &self.options.headers,
        )
        .resolve(&url, Some(entry))
        .await?;

        let blob = repo_layout.blob_path(&metadata.content_hash);
        {
            let _guard = self.locks.acquire(&blob).await;
            if blob.is_file() {
                debug!(blob = %blob.display(), "blob already cached");
            } else if let Some(source) = self.layout.find_blob_elsewhere(repo, &metadata.content_hash)
            {
                repo_layout.adopt_blob(&source, &blob)?;
            } else {
                let staging = repo_layout.staging_path(&metadata.content_hash);
                self.transfer(&attempt, &metadata, &staging).await?;
                repo_layout.promote(&staging, &blob)?;
            }
        }

        self.report(&attempt, FetchPhase::Committing, metadata.size, metadata.size);
        repo_layout.publish(&blob, &pointer)?;
        self.record_revision(&repo_layout, revision, &metadata);

        self.report(&attempt, FetchPhase::Completed, metadata.size, metadata.size);
        info!(
            %repo,
            path = %entry.relative_path,
            hash = %metadata.content_hash,
            size = metadata.size,
            "file cached"
        );
        Ok(pointer)
    }

    /// Bring the staging file up to `metadata.size` bytes and verify it.
    async fn transfer(
        &self,
        attempt: &Attempt<'_>,
        metadata: &FileMetadata,
        staging: &Path,
    ) -> Result<()> {
        if let Some(parent) = staging.parent() {
            hubcache_fs::create_dir_all(parent)?;
        }

        let mut offset = staging_len(staging).await?;
        if offset > metadata.size {
            debug!(staging = %staging.display(), offset, size = metadata.size, "staging oversized, restarting");
            remove_staging(staging).await?;
            offset = 0;
        }

        if metadata.size == 0 {
            // Nothing to fetch, but promotion still needs a file to rename.
            tokio::fs::File::create(staging)
                .await
                .map_err(|e| Error::io(staging, e))?;
        } else if offset < metadata.size {
            self.stream_into(attempt, metadata, staging, offset).await?;
        } else {
            debug!(staging = %staging.display(), "staging already complete");
        }

        self.report(attempt, FetchPhase::Verifying, metadata.size, metadata.size);
        self.verify(metadata, staging).await
    }

    async fn stream_into(
        &self,
        attempt: &Attempt<'_>,
        metadata: &FileMetadata,
        staging: &Path,
        mut offset: u64,
    ) -> Result<()> {
        let mut headers = self.options.headers.to_vec();
        if offset > 0 {
            debug!(url = %metadata.location, offset, "resuming transfer");
            headers.push(("Range".to_string(), format!("bytes={offset}-")));
        }

        let response = self
            .client
            .get(&metadata.location, &headers)
            .await
            .map_err(|e| Error::Unreachable(format!("{}: {e}", metadata.location)))?;
        let status = response.head.status;
        if status == RANGE_NOT_SATISFIABLE {
            debug!(url = %metadata.location, offset, "range not satisfiable, treating as complete");
            return Ok(());
        }
        if !is_success(status) {
            return Err(Error::Transport {
                url: metadata.location.clone(),
                status,
            });
        }
        if offset > 0 && status != 206 {
            debug!(url = %metadata.location, status, "range ignored, restarting from zero");
            offset = 0;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(offset > 0)
            .truncate(offset == 0)
            .open(staging)
            .await
            .map_err(|e| Error::io(staging, e))?;

        self.report(attempt, FetchPhase::Downloading, offset, metadata.size);
        let mut body = response.body;
        let mut written = offset;
        let result = async {
            while let Some(chunk) = body.next().await {
                let chunk =
                    chunk.map_err(|e| Error::Unreachable(format!("{}: {e}", metadata.location)))?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| Error::io(staging, e))?;
                written += chunk.len() as u64;
                self.report(attempt, FetchPhase::Downloading, written, metadata.size);
                self.check_paused(attempt)?;
            }
            Ok::<(), Error>(())
        }
        .await;

        // Whatever arrived stays on disk for the next attempt.
        file.flush().await.map_err(|e| Error::io(staging, e))?;
        result
    }

    /// Size first, then content hash when it is a SHA-256 digest.
    async fn verify(&self, metadata: &FileMetadata, staging: &Path) -> Result<()> {
        let actual = staging_len(staging).await?;
        if actual != metadata.size {
            if actual > metadata.size {
                remove_staging(staging).await?;
            }
            return Err(Error::SizeMismatch {
                path: staging.to_path_buf(),
                expected: metadata.size,
                actual,
            });
        }

        if !self.options.verify_checksums || !is_sha256_hex(&metadata.content_hash) {
            return Ok(());
        }
        let digest = hash_file(staging).await?;
        if let Err(source) = expect_hex(&metadata.content_hash, &digest) {
            remove_staging(staging).await?;
            return Err(Error::Verification {
                path: staging.to_path_buf(),
                source,
            });
        }
        debug!(staging = %staging.display(), "checksum verified");
        Ok(())
    }

    fn record_revision(&self, repo_layout: &RepoLayout, revision: &str, metadata: &FileMetadata) {
        let Some(commit) = metadata.revision_id.as_deref() else {
            return;
        };
        // The pointer is already published; a missing ref only costs a lookup.
        if let Err(e) = repo_layout.record_revision(revision, commit) {
            warn!(revision, commit, error = %e, "failed to record revision");
        }
    }

    fn check_paused(&self, attempt: &Attempt<'_>) -> Result<()> {
        if self.options.paused.is_paused(&attempt.repo) {
            info!(repo = %attempt.repo, path = attempt.path, "download paused");
            return Err(Error::Paused(attempt.repo.clone()));
        }
        Ok(())
    }

    fn report(&self, attempt: &Attempt<'_>, phase: FetchPhase, bytes: u64, total: u64) {
        self.options.report(Progress {
            phase,
            path: attempt.path.to_string(),
            bytes_downloaded: bytes,
            total_bytes: total,
            attempt: attempt.number,
        });
    }
}

async fn staging_len(staging: &Path) -> Result<u64> {
    match tokio::fs::metadata(staging).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(Error::io(staging, e)),
    }
}

async fn remove_staging(staging: &Path) -> Result<()> {
    match tokio::fs::remove_file(staging).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(staging, e)),
    }
}

async fn hash_file(path: &Path) -> Result<Vec<u8>> {
    let read_err = |e| {
        Error::Filesystem(hubcache_fs::Error::Read {
            path: path.to_path_buf(),
            source: e,
        })
    };
    let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let mut hasher = Sha256Hasher::new();
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = file.read(&mut buf).await.map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
