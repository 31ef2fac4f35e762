use hubcache_fs::{
    Error, HardlinkOrCopyOptions, LinkKind, PermissionMode, atomic_symlink, atomic_write,
    create_dir_all, exists_no_follow, hardlink_or_copy, rename,
};
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn test_promote_then_publish() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let blobs = dir.path().join("blobs");
    create_dir_all(&blobs).unwrap();
    let staging = blobs.join("abc.incomplete");
    let blob = blobs.join("abc");
    std::fs::write(&staging, b"content").unwrap();

    rename(&staging, &blob).unwrap();
    PermissionMode::ReadOnly.apply_to_path(&blob).unwrap();
    assert!(!staging.exists());
    assert_eq!(
        std::fs::metadata(&blob).unwrap().permissions().mode() & 0o777,
        0o444
    );

    let pointer = dir.path().join("snapshots/main/a.bin");
    create_dir_all(pointer.parent().unwrap()).unwrap();
    atomic_symlink("../../blobs/abc", &pointer, LinkKind::File).unwrap();
    assert!(exists_no_follow(&pointer));
    assert_eq!(std::fs::read(&pointer).unwrap(), b"content");
}

#[test]
fn test_rename_missing_source_reports_destination() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("dest");
    let err = rename(dir.path().join("missing"), &dest).unwrap_err();
    assert!(matches!(err, Error::Write { path, .. } if path == dest));
}

#[test]
fn test_atomic_write_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("refs").join("main");
    create_dir_all(path.parent().unwrap()).unwrap();

    atomic_write(&path, b"0123abcd").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "0123abcd");
}

#[cfg(unix)]
#[test]
fn test_hardlink_or_copy_hardlink() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let src = dir.path().join("source.bin");
    let dest = dir.path().join("hardlink.bin");
    std::fs::write(&src, "shared content").unwrap();

    let linked = hardlink_or_copy(
        &src,
        &dest,
        HardlinkOrCopyOptions::new().permissions(PermissionMode::ReadOnly),
    )
    .unwrap();
    assert!(linked);

    let src_meta = std::fs::metadata(&src).unwrap();
    let dest_meta = std::fs::metadata(&dest).unwrap();
    assert_eq!(src_meta.ino(), dest_meta.ino());
}
