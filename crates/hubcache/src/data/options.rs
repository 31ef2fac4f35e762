use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::pause::PausedRepositories;
use super::progress::{Progress, RepositoryProgress};
use crate::core::retry_delay;

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The same delay before every retry.
    #[default]
    Fixed,
    /// `delay * 2^(retry - 1)`, saturating.
    Exponential,
}

/// Bounded attempts with a delay in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => retry_delay(attempt.saturating_sub(1), self.delay),
        }
    }
}

/// Transport timeouts handed to the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// Maximum idle time between two body reads.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            read: Duration::from_secs(60),
        }
    }
}

/// Configuration for repository and file downloads.
///
/// # Examples
///
/// ```
/// use hubcache::{DownloadOptions, RetryPolicy};
/// use std::time::Duration;
///
/// let options = DownloadOptions::default()
///     .retry(RetryPolicy::default().max_attempts(5).delay(Duration::from_millis(200)))
///     .concurrency(4)
///     .header("Authorization", "Bearer token");
/// ```
#[derive(Clone)]
pub struct DownloadOptions {
    pub retry: RetryPolicy,

    /// Extra headers sent with every probe, listing and transfer request.
    pub headers: Arc<[(String, String)]>,

    pub timeouts: Timeouts,

    /// Files downloaded at the same time within one repository.
    ///
    /// Default: 1, i.e. listing order, one file after the other.
    pub concurrency: usize,

    /// Check SHA-256 content hashes before a staged file is promoted.
    ///
    /// Only hashes that look like SHA-256 digests are checked.
    pub verify_checksums: bool,

    pub paused: PausedRepositories,

    /// Invoked on phase transitions and after each body chunk.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,

    /// Invoked after each file of a repository download completes.
    pub on_repository_progress: Option<Arc<dyn Fn(&RepositoryProgress) + Send + Sync>>,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("retry", &self.retry)
            .field("headers", &self.headers)
            .field("timeouts", &self.timeouts)
            .field("concurrency", &self.concurrency)
            .field("verify_checksums", &self.verify_checksums)
            .field("paused", &self.paused)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .field(
                "on_repository_progress",
                &self.on_repository_progress.as_ref().map(|_| "{ ... }"),
            )
            .finish()
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            headers: Arc::new([]),
            timeouts: Timeouts::default(),
            concurrency: 1,
            verify_checksums: true,
            paused: PausedRepositories::default(),
            on_progress: None,
            on_repository_progress: None,
        }
    }
}

impl DownloadOptions {
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = self.headers.to_vec();
        headers.push((name.into(), value.into()));
        self.headers = headers.into();
        self
    }

    #[must_use]
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Values below one are raised to one.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    #[must_use]
    pub fn paused(mut self, paused: PausedRepositories) -> Self {
        self.paused = paused;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_repository_progress(
        mut self,
        callback: impl Fn(&RepositoryProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_repository_progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }

    pub(crate) fn report_repository(&self, progress: RepositoryProgress) {
        if let Some(ref callback) = self.on_repository_progress {
            callback(&progress);
        }
    }
}
