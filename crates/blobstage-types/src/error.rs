use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid digest format: {0}")]
    InvalidDigest(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid encoded length for {algorithm}: expected {expected}, got {actual}")]
    InvalidLength {
        algorithm: String,
        expected: usize,
        actual: usize,
    },
}
