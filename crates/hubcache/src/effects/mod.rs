//! Network and filesystem effects.
//!
//! Everything that sends a request or touches the cache root lives here;
//! [`crate::core`] stays pure.

mod coordinator;
mod http;
mod layout;
mod listing;
mod lock;
mod metadata;
mod orchestrator;
mod retry;

pub use coordinator::Downloader;
pub use http::{BoxStream, HttpClient, ResponseHead, StreamedResponse};
pub use layout::{CacheLayout, RepoLayout};
pub use listing::list_files;
pub use lock::StagingLocks;
pub use metadata::MetadataResolver;
pub use retry::with_retries;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
