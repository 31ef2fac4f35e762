use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Repositories whose downloads should stop at the next chunk boundary.
///
/// Cloning shares the underlying set, so a UI thread can pause a download
/// that a [`crate::Downloader`] is running.
#[derive(Debug, Clone, Default)]
pub struct PausedRepositories {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PausedRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self, repo: &str) {
        self.with(|set| {
            set.insert(repo.to_string());
        });
    }

    pub fn resume(&self, repo: &str) {
        self.with(|set| {
            set.remove(repo);
        });
    }

    pub fn is_paused(&self, repo: &str) -> bool {
        self.with(|set| set.contains(repo))
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashSet<String>) -> T) -> T {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}
