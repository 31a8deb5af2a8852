//! Credential digest derivation using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that provides
//! resistance to both GPU and time-memory trade-off attacks. The cost
//! parameters are fixed so that every stored credential can be re-derived
//! without carrying parameters in the encoded string.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use spicerack_common::{Error, Result, SensitiveBytes};

/// Length of the derived digest in bytes.
pub const DIGEST_LENGTH: usize = 24;

/// Shortest salt Argon2 accepts.
pub const MIN_SALT_LENGTH: usize = 8;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
    /// Digest length in bytes.
    pub output_len: usize,
}

impl HashParams {
    /// The only parameter set used for credential hashing.
    ///
    /// Stored credentials do not record their parameters, so changing any of
    /// these values makes every existing hash unverifiable. Callers needing
    /// stronger parameters must wrap this primitive instead.
    pub const FIXED: Self = Self {
        memory_cost: 8192, // 8 MiB
        time_cost: 2,
        parallelism: 1,
        output_len: DIGEST_LENGTH,
    };

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self::FIXED
    }
}

/// Derive a credential digest from a password, salt and optional pepper.
///
/// The Argon2 salt input is `salt || pepper`; with no pepper it is the salt
/// alone. The digest is deterministic given the same inputs.
///
/// # Preconditions
/// - `salt` must be at least MIN_SALT_LENGTH bytes
///
/// # Errors
/// - Returns `InvalidInput` if the salt is too short
/// - Returns `Crypto` if Argon2 rejects the inputs
///
/// # Security
/// - The peppered salt and the digest are zeroized on drop
pub fn derive_digest(
    password: &[u8],
    salt: &[u8],
    pepper: Option<&[u8]>,
) -> Result<Zeroizing<[u8; DIGEST_LENGTH]>> {
    if salt.len() < MIN_SALT_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Salt must be at least {} bytes, got {}",
            MIN_SALT_LENGTH,
            salt.len()
        )));
    }

    let peppered_salt = SensitiveBytes::concat(salt, pepper.unwrap_or_default());
    debug!(
        salt_len = salt.len(),
        peppered = pepper.is_some(),
        "Deriving credential digest"
    );

    let argon2 = HashParams::FIXED.argon2()?;
    let mut digest = Zeroizing::new([0u8; DIGEST_LENGTH]);
    argon2
        .hash_password_into(password, peppered_salt.as_bytes(), &mut digest[..])
        .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(digest)
}
