mod atomic_write;
mod hardlink;
mod symlink;

pub use atomic_write::atomic_write;
pub use hardlink::{HardlinkOrCopyOptions, hardlink_or_copy};
pub use symlink::{LinkKind, atomic_symlink, exists_no_follow};

use crate::{Error, Result};
use std::path::Path;

pub fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Rename `src` to `dest`, replacing `dest` if it exists.
pub fn rename(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let (src, dest) = (src.as_ref(), dest.as_ref());
    std::fs::rename(src, dest).map_err(|e| Error::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}
