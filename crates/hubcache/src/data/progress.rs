use std::fmt;

/// Phases of a single file download.
///
/// Resolving → Downloading → Verifying → Committing → Completed. A retry
/// starts over at Resolving with a higher `attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Metadata probe in flight.
    #[default]
    Resolving,
    /// Body bytes are being appended to the staging file.
    Downloading,
    /// Size and content hash of the staged file are being checked.
    Verifying,
    /// Staging file promoted to a blob, pointer being published.
    Committing,
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchPhase::Resolving => "Resolving",
            FetchPhase::Downloading => "Downloading",
            FetchPhase::Verifying => "Verifying",
            FetchPhase::Committing => "Committing",
            FetchPhase::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// State of one file download, passed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: FetchPhase,
    /// Path of the file inside its repository.
    pub path: String,
    /// Bytes present in the staging file, including a resumed prefix.
    pub bytes_downloaded: u64,
    /// Resolved before any transfer starts, so always known.
    pub total_bytes: u64,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl Progress {
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            if self.is_completed() { 100.0 } else { 0.0 }
        } else {
            (self.bytes_downloaded as f64 / self.total_bytes as f64) * 100.0
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }

    #[must_use]
    pub fn is_retrying(&self) -> bool {
        self.attempt > 1
    }
}

/// Aggregate state of a repository download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepositoryProgress {
    pub files_total: usize,
    pub files_done: usize,
    /// Sum of the listing's expected sizes.
    pub bytes_total: u64,
    pub bytes_done: u64,
}

impl RepositoryProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.files_done == self.files_total
    }
}
