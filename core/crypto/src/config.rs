//! Secret material configuration.
//!
//! Peppers and keys are long-lived and owned by the application, not by this
//! crate. `SecretConfig` is the JSON shape used to hand them over:
//!
//! ```json
//! { "pepper": "<base64>", "key": "<base64>" }
//! ```
//!
//! Both fields are optional. A missing pepper means unpeppered hashing; a
//! missing key means no cipher can be built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::cipher::SymmetricCipher;
use crate::keys::{EncryptionKey, Pepper};
use crate::password::PasswordHasher;
use spicerack_common::{Error, Result};

/// Base64-encoded pepper and key, as stored in a configuration file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretConfig {
    /// Pepper for password hashing (base64).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pepper: Option<String>,
    /// Key for symmetric encryption (base64).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SecretConfig {
    /// Parse configuration from JSON.
    ///
    /// # Errors
    /// - Returns `Config` if the JSON is malformed or has unknown fields
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Serialize configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Read configuration from a JSON file.
    ///
    /// # Errors
    /// - Returns `Io` if the file cannot be read
    /// - Returns `Config` if its content is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading secret configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Build a password hasher, peppered when a pepper is configured.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the pepper is not valid base64
    pub fn hasher(&self) -> Result<PasswordHasher> {
        let pepper = self.pepper.as_deref().map(Pepper::from_base64).transpose()?;
        Ok(PasswordHasher::new(pepper))
    }

    /// Build a cipher from the configured key.
    ///
    /// # Errors
    /// - Returns `Config` if no key is configured
    /// - Returns `InvalidInput` if the key is not valid base64 or has a bad length
    pub fn cipher(&self) -> Result<SymmetricCipher> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| Error::Config("No encryption key configured".to_string()))?;
        Ok(SymmetricCipher::new(EncryptionKey::from_base64(key)?))
    }
}

impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
