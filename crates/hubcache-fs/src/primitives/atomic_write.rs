use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `content` to a sibling temp file, then rename it over `path`.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .ok_or_else(|| Error::NoParent(path.to_path_buf()))?;

    let tmp_path = parent.join(format!(".tmp.{}.hubcache", uuid::Uuid::new_v4()));

    let write = |tmp: &Path| -> std::io::Result<()> {
        let mut file = fs::File::create(tmp)?;
        file.write_all(content)?;
        file.sync_all()
    };
    write(&tmp_path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: tmp_path.clone(),
            source: e,
        }
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
