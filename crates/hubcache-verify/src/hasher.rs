use sha2::Digest;

use crate::{Result, VerifyError};

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self(sha2::Sha256::new())
    }

    pub fn digest(data: &[u8]) -> Vec<u8> {
        sha2::Sha256::digest(data).to_vec()
    }
}

/// `true` for a 64-character hex string, i.e. something that can be a
/// SHA-256 digest. Providers also hand out git blob ids and opaque ETags,
/// which are not content digests and cannot be verified.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compare a finalized digest against an expected hex string (any case).
pub fn expect_hex(expected: &str, actual: &[u8]) -> Result<()> {
    let expected_bytes =
        hex::decode(expected).map_err(|_| VerifyError::InvalidHex(expected.to_string()))?;
    if expected_bytes == actual {
        Ok(())
    } else {
        Err(VerifyError::HashMismatch {
            expected: expected.to_ascii_lowercase(),
            actual: hex::encode(actual),
        })
    }
}
