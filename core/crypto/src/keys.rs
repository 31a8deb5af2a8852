//! Key and pepper types with secure memory handling.
//!
//! Both types zeroize their memory on drop and never print their contents
//! through `Debug`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::spice::{generate_array, DEFAULT_SPICE_SIZE};
use spicerack_common::{Error, Result};

/// Key length for AES-128 in bytes.
pub const AES_128_KEY_LENGTH: usize = 16;

/// Key length for AES-192 in bytes.
pub const AES_192_KEY_LENGTH: usize = 24;

/// Key length for AES-256 in bytes.
pub const AES_256_KEY_LENGTH: usize = 32;

/// AES variant selected by the length of a caller-supplied key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    /// Select the AES variant for a key of `len` bytes.
    ///
    /// # Errors
    /// - Returns `InvalidInput` unless `len` is 16, 24 or 32
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            AES_128_KEY_LENGTH => Ok(Self::Aes128),
            AES_192_KEY_LENGTH => Ok(Self::Aes192),
            AES_256_KEY_LENGTH => Ok(Self::Aes256),
            other => Err(Error::InvalidInput(format!(
                "Invalid key length: expected 16, 24 or 32 bytes, got {}",
                other
            ))),
        }
    }

    /// Key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            Self::Aes128 => AES_128_KEY_LENGTH,
            Self::Aes192 => AES_192_KEY_LENGTH,
            Self::Aes256 => AES_256_KEY_LENGTH,
        }
    }
}

/// Application-wide secret mixed into every password hash.
///
/// The pepper is appended to the per-hash salt before key derivation and is
/// never written into the hashed credential, so it must be supplied again at
/// verification time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Pepper {
    bytes: Vec<u8>,
}

impl Pepper {
    /// Create a pepper from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Decode a pepper from standard base64, as it is usually kept in configuration.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if `encoded` is not valid base64
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidInput(format!("Pepper is not valid base64: {}", e)))?;
        Ok(Self { bytes })
    }

    /// Generate a random pepper of the default spice size.
    pub fn generate() -> Self {
        let spice: [u8; DEFAULT_SPICE_SIZE] = generate_array();
        Self {
            bytes: spice.to_vec(),
        }
    }

    /// Get the pepper bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode the pepper as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pepper([REDACTED])")
    }
}

/// Symmetric encryption key of a length accepted by AES.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: Vec<u8>,
}

impl EncryptionKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the length is not 16, 24 or 32 bytes
    pub fn from_bytes(key: &[u8]) -> Result<Self> {
        KeySize::from_len(key.len())?;
        Ok(Self { key: key.to_vec() })
    }

    /// Decode a key from standard base64.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if `encoded` is not valid base64 or has a bad length
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidInput(format!("Key is not valid base64: {}", e)))?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Generate a random 256-bit key.
    pub fn generate() -> Self {
        let mut key: [u8; AES_256_KEY_LENGTH] = generate_array();
        let generated = Self { key: key.to_vec() };
        key.zeroize();
        generated
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// AES variant this key selects.
    pub fn size(&self) -> KeySize {
        match self.key.len() {
            AES_128_KEY_LENGTH => KeySize::Aes128,
            AES_192_KEY_LENGTH => KeySize::Aes192,
            _ => KeySize::Aes256,
        }
    }

    /// Encode the key as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.key)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey([REDACTED; {:?}])", self.size())
    }
}
