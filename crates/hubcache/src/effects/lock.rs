use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, Weak};

use tokio::sync::OwnedMutexGuard;

static PROCESS_LOCKS: LazyLock<StagingLocks> = LazyLock::new(StagingLocks::new);

/// Mutual exclusion keyed by blob path.
///
/// At most one task appends to a given staging file. Entries are created on
/// demand and vanish once no guard or waiter holds them.
#[derive(Debug, Clone, Default)]
pub struct StagingLocks {
    table: Arc<Mutex<HashMap<PathBuf, Weak<tokio::sync::Mutex<()>>>>>,
}

impl StagingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shared by every downloader in this process.
    pub fn process_wide() -> Self {
        PROCESS_LOCKS.clone()
    }

    /// Wait for exclusive access to `blob`.
    pub async fn acquire(&self, blob: &Path) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.retain(|_, entry| entry.strong_count() > 0);
            match table.get(blob).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(tokio::sync::Mutex::new(()));
                    table.insert(blob.to_path_buf(), Arc::downgrade(&mutex));
                    mutex
                }
            }
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.values().filter(|entry| entry.strong_count() > 0).count()
    }
}
