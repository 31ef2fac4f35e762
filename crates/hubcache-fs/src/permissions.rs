use crate::{Error, Result};
use std::path::Path;

/// File permission modes applied to cache entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the process umask produced.
    #[default]
    Inherit,

    /// On Unix `0o444`; on Windows the `readonly` attribute.
    ReadOnly,
}

impl PermissionMode {
    /// Apply the permission mode to a file or directory path.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        let write_err = |e| Error::Write {
            path: path.to_path_buf(),
            source: e,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let Some(mode) = self.to_unix_mode() else {
                return Ok(());
            };
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .map_err(write_err)?;
        }

        #[cfg(windows)]
        {
            if self == Self::Inherit {
                return Ok(());
            }
            let mut perms = std::fs::metadata(path).map_err(write_err)?.permissions();
            perms.set_readonly(!self.is_writable());
            std::fs::set_permissions(path, perms).map_err(write_err)?;
        }

        Ok(())
    }

    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::ReadOnly => Some(0o444),
        }
    }

    /// `Inherit` reports `true`: without the umask nothing says otherwise.
    pub fn is_writable(self) -> bool {
        self.to_unix_mode().is_none_or(|mode| mode & 0o222 != 0)
    }
}
