//! Common error types for spicerack.

use thiserror::Error;

/// Top-level error type for spicerack operations.
///
/// A wrong password is not an error: verification reports it as `Ok(false)`.
/// The variants here cover corrupted input and caller precondition failures.
#[derive(Debug, Error)]
pub enum Error {
    /// A stored credential string could not be decomposed into digest and salt.
    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    /// The key, IV and ciphertext did not produce a valid plaintext.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The underlying primitive rejected the operation.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Configuration content could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error points at corrupted stored data rather than a caller mistake.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::MalformedHash(_) | Self::DecryptionFailed(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
