use crate::permissions::PermissionMode;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct HardlinkOrCopyOptions {
    /// Applied to a copy before it is renamed into place. Hard links share
    /// the source's mode and are left alone.
    pub permissions: PermissionMode,
}

impl HardlinkOrCopyOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: PermissionMode) -> Self {
        self.permissions = mode;
        self
    }
}

/// Hard-link `src` at `dest`; across devices, copy through a sibling temp
/// file and rename it over `dest`.
///
/// Returns `true` when a hard link was created and `false` when the content
/// was copied. A failed copy leaves `dest` untouched.
pub fn hardlink_or_copy(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: HardlinkOrCopyOptions,
) -> Result<bool> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    match fs::hard_link(src, dest) {
        Ok(()) => Ok(true),
        Err(e) if e.raw_os_error() == Some(18) || e.kind() == std::io::ErrorKind::CrossesDevices => {
            copy_into_place(src, dest, options.permissions).map(|()| false)
        }
        Err(e) => Err(Error::Link {
            target: src.to_path_buf(),
            link: dest.to_path_buf(),
            source: e,
        }),
    }
}

fn copy_into_place(src: &Path, dest: &Path, mode: PermissionMode) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| Error::NoParent(dest.to_path_buf()))?;
    let tmp_path = parent.join(format!(".tmp.{}.hubcache", uuid::Uuid::new_v4()));

    let staged = fs::copy(src, &tmp_path)
        .map_err(|e| Error::Write {
            path: tmp_path.clone(),
            source: e,
        })
        .and_then(|_| mode.apply_to_path(&tmp_path))
        .and_then(|()| {
            fs::rename(&tmp_path, dest).map_err(|e| Error::Write {
                path: dest.to_path_buf(),
                source: e,
            })
        });
    if staged.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    staged
}
