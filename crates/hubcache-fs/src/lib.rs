//! Filesystem primitives for a content-addressed model cache.
//!
//! Every mutation is either a single rename or a temp-then-rename sequence,
//! so observers see a path either absent or complete.

mod error;
pub mod permissions;
mod primitives;

pub use error::{Error, Result};
pub use permissions::PermissionMode;
pub use primitives::{
    HardlinkOrCopyOptions, LinkKind, atomic_symlink, atomic_write, create_dir_all,
    exists_no_follow, hardlink_or_copy, rename,
};
