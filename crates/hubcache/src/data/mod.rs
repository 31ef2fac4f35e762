//! Immutable data types shared across the download pipeline.

pub mod options;
pub mod pause;
pub mod progress;
pub mod repo;

pub use options::{Backoff, DownloadOptions, RetryPolicy, Timeouts};
pub use pause::PausedRepositories;
pub use progress::{FetchPhase, Progress, RepositoryProgress};
pub use repo::{FileEntry, FileMetadata, RepositoryId};
