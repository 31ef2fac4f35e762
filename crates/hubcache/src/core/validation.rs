use crate::error::{Error, Result};

/// 301, 302, 303, 307 and 308.
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Reject repository paths that would escape the snapshot directory once
/// joined onto it.
pub fn check_relative_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(Error::Terminal(format!("invalid repository path '{path}'")));
    }
    Ok(())
}

/// Revisions become a directory under `snapshots/`; `refs/pr/1` style
/// names nest, but may not climb out.
pub fn check_revision(revision: &str) -> Result<()> {
    check_relative_path(revision)
        .map_err(|_| Error::Terminal(format!("invalid revision '{revision}'")))
}
