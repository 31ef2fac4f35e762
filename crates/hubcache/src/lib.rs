//! Resumable, deduplicating downloads of model repositories.
//!
//! Files are fetched from a hosting provider (HuggingFace, ModelScope,
//! Modelers) into a cache root shared with other tools:
//!
//! - content lands once in `models--<ns>--<name>/blobs/<hash>`,
//! - `snapshots/<revision>/<path>` symlinks name it,
//! - a top-level link per repository appears only once every file is in.
//!
//! Interrupted transfers resume from their `.incomplete` staging file.
//!
//! The crate is split the same way as the pipeline: [`core`] holds pure
//! helpers, [`provider`] the per-provider dialects, and the effectful pieces
//! are re-exported at the root.

pub mod core;
mod data;
mod effects;
mod error;
pub mod provider;

pub use data::{
    Backoff, DownloadOptions, FetchPhase, FileEntry, FileMetadata, PausedRepositories, Progress,
    RepositoryId, RepositoryProgress, RetryPolicy, Timeouts,
};
pub use effects::{
    BoxStream, CacheLayout, Downloader, HttpClient, MetadataResolver, RepoLayout,
    ResponseHead, StagingLocks, StreamedResponse, list_files, with_retries,
};
pub use error::{Error, Result};
pub use provider::{MetadataHeaders, Provider, ProviderAdapter};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
