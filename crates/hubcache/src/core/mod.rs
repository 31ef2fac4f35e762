//! Pure transformations: no I/O happens in this module.

mod hash;
mod location;
mod retry;
mod validation;

pub use hash::normalize_hash;
pub use location::resolve_location;
pub use retry::retry_delay;
pub use validation::{check_relative_path, check_revision, is_redirect, is_success};
