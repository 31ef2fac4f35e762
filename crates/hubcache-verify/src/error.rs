#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("expected digest is not valid hex: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
