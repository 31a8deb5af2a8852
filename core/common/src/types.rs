//! Common types used throughout spicerack.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive data wrapper that zeroizes on drop.
///
/// Holds the peppered salt (`salt || pepper`) that `kdf::derive_digest`
/// feeds to Argon2, so the pepper copy is wiped once the digest is computed.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Create new sensitive bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Create sensitive bytes by concatenating two slices.
    pub fn concat(head: &[u8], tail: &[u8]) -> Self {
        let mut data = Vec::with_capacity(head.len() + tail.len());
        data.extend_from_slice(head);
        data.extend_from_slice(tail);
        Self(data)
    }

    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}
