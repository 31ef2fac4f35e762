//! On-disk cache shape.
//!
//! ```text
//! <root>/models--<ns>--<name>/blobs/<hash>              committed content
//! <root>/models--<ns>--<name>/blobs/<hash>.incomplete   staging
//! <root>/models--<ns>--<name>/snapshots/<rev>/<path>    pointer -> ../../blobs/<hash>
//! <root>/models--<ns>--<name>/refs/<rev>                commit id
//! <root>/<name>                                         repository link -> snapshots/<rev>
//! ```
//!
//! Every mutation of the cache goes through this module.

use std::path::{Path, PathBuf};

use hubcache_fs::{
    HardlinkOrCopyOptions, LinkKind, PermissionMode, atomic_symlink, atomic_write,
    create_dir_all, exists_no_follow, hardlink_or_copy,
};
use tracing::debug;

use crate::data::RepositoryId;
use crate::error::{Error, Result};

const STAGING_SUFFIX: &str = ".incomplete";
const FOLDER_PREFIX: &str = "models--";

/// The cache root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths inside the folder of one repository.
    pub fn repo(&self, repo: &RepositoryId) -> RepoLayout {
        RepoLayout {
            folder: self.root.join(repo.folder_name()),
        }
    }

    /// Top-level repository link. Its presence means every file of some
    /// revision is cached.
    pub fn link_path(&self, repo: &RepositoryId) -> PathBuf {
        self.root.join(repo.name())
    }

    pub fn is_repository_published(&self, repo: &RepositoryId) -> bool {
        exists_no_follow(self.link_path(repo))
    }

    /// Point the repository link at the snapshot of `revision`.
    pub fn publish_repository(&self, repo: &RepositoryId, revision: &str) -> Result<PathBuf> {
        let link = self.link_path(repo);
        let target = Path::new(&repo.folder_name()).join("snapshots").join(revision);
        create_dir_all(&self.root)?;
        atomic_symlink(&target, &link, LinkKind::Dir)?;
        debug!(link = %link.display(), target = %target.display(), "repository link published");
        Ok(link)
    }

    /// Remove the repository link, then the repository folder.
    ///
    /// Returns `false` when nothing was cached.
    pub fn remove_repository(&self, repo: &RepositoryId) -> Result<bool> {
        let link = self.link_path(repo);
        let folder = self.repo(repo).folder;
        let mut removed = false;

        if exists_no_follow(&link) {
            std::fs::remove_file(&link).map_err(|e| Error::io(&link, e))?;
            removed = true;
        }
        if folder.exists() {
            std::fs::remove_dir_all(&folder).map_err(|e| Error::io(&folder, e))?;
            removed = true;
        }
        Ok(removed)
    }

    /// Names of the repository links published in the cache root.
    pub fn local_repositories(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_error(&self.root, e))?;
            let Ok(target) = std::fs::read_link(entry.path()) else {
                continue;
            };
            if target.to_string_lossy().starts_with(FOLDER_PREFIX) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// A committed blob with `hash` in another repository's folder.
    pub fn find_blob_elsewhere(&self, repo: &RepositoryId, hash: &str) -> Option<PathBuf> {
        let own = repo.folder_name();
        std::fs::read_dir(&self.root)
            .ok()?
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(FOLDER_PREFIX) && name != own.as_str()
            })
            .map(|entry| entry.path().join("blobs").join(hash))
            .find(|candidate| candidate.is_file())
    }
}

/// Paths inside `<root>/models--<ns>--<name>`.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    folder: PathBuf,
}

impl RepoLayout {
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn blob_path(&self, hash: &str) -> PathBuf {
        self.folder.join("blobs").join(hash)
    }

    pub fn staging_path(&self, hash: &str) -> PathBuf {
        self.folder
            .join("blobs")
            .join(format!("{hash}{STAGING_SUFFIX}"))
    }

    pub fn snapshot_dir(&self, revision: &str) -> PathBuf {
        self.folder.join("snapshots").join(revision)
    }

    pub fn pointer_path(&self, revision: &str, relative_path: &str) -> PathBuf {
        relative_path
            .split('/')
            .fold(self.snapshot_dir(revision), |path, segment| path.join(segment))
    }

    pub fn refs_path(&self, revision: &str) -> PathBuf {
        self.folder.join("refs").join(revision)
    }

    /// Existence of the pointer itself; the link is not followed.
    pub fn is_published(&self, pointer: &Path) -> bool {
        exists_no_follow(pointer)
    }

    /// Create the pointer as a relative symlink to `blob`. A pointer that
    /// already exists is left alone.
    pub fn publish(&self, blob: &Path, pointer: &Path) -> Result<()> {
        if self.is_published(pointer) {
            return Ok(());
        }
        let parent = pointer
            .parent()
            .ok_or_else(|| hubcache_fs::Error::NoParent(pointer.to_path_buf()))?;
        create_dir_all(parent)?;

        let target = self.relative_target(blob, pointer)?;
        atomic_symlink(&target, pointer, LinkKind::File)?;
        debug!(pointer = %pointer.display(), target = %target.display(), "pointer published");
        Ok(())
    }

    /// Rename a complete staging file into the blob store and make it
    /// read-only.
    pub fn promote(&self, staging: &Path, blob: &Path) -> Result<()> {
        hubcache_fs::rename(staging, blob)?;
        PermissionMode::ReadOnly.apply_to_path(blob)?;
        debug!(blob = %blob.display(), "staging promoted");
        Ok(())
    }

    /// Bring a blob committed by another repository into this one.
    pub fn adopt_blob(&self, source: &Path, blob: &Path) -> Result<()> {
        if let Some(parent) = blob.parent() {
            create_dir_all(parent)?;
        }
        let linked = hardlink_or_copy(
            source,
            blob,
            HardlinkOrCopyOptions::new().permissions(PermissionMode::ReadOnly),
        )?;
        debug!(source = %source.display(), blob = %blob.display(), linked, "blob adopted");
        Ok(())
    }

    /// Remember which commit `revision` resolved to.
    pub fn record_revision(&self, revision: &str, commit: &str) -> Result<()> {
        let path = self.refs_path(revision);
        if std::fs::read_to_string(&path).is_ok_and(|current| current == commit) {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        atomic_write(&path, commit.as_bytes())?;
        Ok(())
    }

    pub fn recorded_revision(&self, revision: &str) -> Option<String> {
        std::fs::read_to_string(self.refs_path(revision)).ok()
    }

    /// `../` up from the pointer's directory to the repository folder, then
    /// down to the blob.
    fn relative_target(&self, blob: &Path, pointer: &Path) -> Result<PathBuf> {
        let below = pointer
            .strip_prefix(&self.folder)
            .map_err(|_| Error::Terminal(format!("{} is outside the cache", pointer.display())))?;
        let blob = blob
            .strip_prefix(&self.folder)
            .map_err(|_| Error::Terminal(format!("{} is outside the cache", blob.display())))?;

        let depth = below.components().count().saturating_sub(1);
        let mut target = PathBuf::new();
        for _ in 0..depth {
            target.push("..");
        }
        target.push(blob);
        Ok(target)
    }
}

fn read_error(path: &Path, source: std::io::Error) -> Error {
    Error::Filesystem(hubcache_fs::Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
