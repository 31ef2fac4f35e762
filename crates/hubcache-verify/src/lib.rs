//! Content verification primitives for cached model artifacts.
//!
//! Digests are computed incrementally, so a staged file can be hashed in
//! fixed-size reads however large it is.
//!
//! # Example
//!
//! ```
//! use hubcache_verify::{Hasher, Sha256Hasher, expect_hex};
//!
//! let mut hasher = Sha256Hasher::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! expect_hex(
//!     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
//!     &hasher.finalize(),
//! )
//! .unwrap();
//! ```

pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher, expect_hex, is_sha256_hex};

mod error;
mod hasher;
