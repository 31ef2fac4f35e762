use crate::{Error, Result};
use std::path::Path;

/// What a symlink points at; only Windows distinguishes the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    File,
    Dir,
}

/// `true` if something exists at `path` itself, without following symlinks.
pub fn exists_no_follow(path: impl AsRef<Path>) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Create `link` pointing at `target` via a temp link and a rename, so a
/// reader never observes a half-created link and concurrent publishers of
/// the same link do not fail each other.
pub fn atomic_symlink(
    target: impl AsRef<Path>,
    link: impl AsRef<Path>,
    kind: LinkKind,
) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();
    let parent = link
        .parent()
        .ok_or_else(|| Error::NoParent(link.to_path_buf()))?;
    let tmp_link = parent.join(format!(".tmp.{}.hubcache", uuid::Uuid::new_v4()));

    create_link(target, &tmp_link, kind).map_err(|e| Error::Link {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        source: e,
    })?;

    std::fs::rename(&tmp_link, link).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_link);
        Error::Link {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path, _kind: LinkKind) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path, kind: LinkKind) -> std::io::Result<()> {
    match kind {
        LinkKind::File => std::os::windows::fs::symlink_file(target, link),
        LinkKind::Dir => std::os::windows::fs::symlink_dir(target, link),
    }
}
