//! Salted and peppered password hashing.
//!
//! A hashed credential is a single ASCII string:
//!
//! ```text
//! BASE64(digest) "." BASE64(salt)
//! ```
//!
//! The digest is 24 bytes of Argon2id output and the salt is 32 fresh random
//! bytes. The pepper is never part of the string; verification needs it again.
//! Because every hash uses a new salt, two hashes of the same password are
//! never equal and must be compared through [`verify`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::kdf::{derive_digest, MIN_SALT_LENGTH};
use crate::keys::Pepper;
use crate::spice::{generate_spice, DEFAULT_SPICE_SIZE};
use spicerack_common::{Error, Result};

/// Separates the digest segment from the salt segment.
///
/// Absent from the standard base64 alphabet, so the first occurrence always
/// marks the boundary.
pub const SALT_DELIMITER: char = '.';

/// Length of the per-hash salt in bytes.
pub const SALT_LENGTH: usize = DEFAULT_SPICE_SIZE;

/// Decomposed view of a stored credential string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedCredential {
    digest: String,
    salt: Vec<u8>,
}

impl HashedCredential {
    /// Split a stored credential into its digest segment and decoded salt.
    ///
    /// # Errors
    /// - Returns `MalformedHash` if the delimiter is missing
    /// - Returns `MalformedHash` if either segment is empty
    /// - Returns `MalformedHash` if the salt is not base64 or is too short
    pub fn parse(encoded: &str) -> Result<Self> {
        let (digest, salt_b64) = encoded.split_once(SALT_DELIMITER).ok_or_else(|| {
            Error::MalformedHash("Password hash does not contain salt".to_string())
        })?;

        if digest.is_empty() {
            return Err(Error::MalformedHash("Digest segment is empty".to_string()));
        }
        if salt_b64.is_empty() {
            return Err(Error::MalformedHash("Salt segment is empty".to_string()));
        }

        let salt = STANDARD
            .decode(salt_b64)
            .map_err(|e| Error::MalformedHash(format!("Salt is not valid base64: {}", e)))?;

        if salt.len() < MIN_SALT_LENGTH {
            return Err(Error::MalformedHash(format!(
                "Salt is {} bytes, shorter than the minimum of {}",
                salt.len(),
                MIN_SALT_LENGTH
            )));
        }

        Ok(Self {
            digest: digest.to_string(),
            salt,
        })
    }

    /// Base64 digest segment, exactly as stored.
    pub fn digest_b64(&self) -> &str {
        &self.digest
    }

    /// Decoded salt bytes.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    fn encode(digest: &[u8], salt: &[u8]) -> String {
        format!(
            "{}{}{}",
            STANDARD.encode(digest),
            SALT_DELIMITER,
            STANDARD.encode(salt)
        )
    }
}

impl fmt::Display for HashedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.digest,
            SALT_DELIMITER,
            STANDARD.encode(&self.salt)
        )
    }
}

/// Hash a password with a fresh random salt and an optional pepper.
///
/// # Postconditions
/// - Returns `BASE64(digest).BASE64(salt)`
/// - Two calls with the same inputs return different strings
///
/// # Errors
/// - Returns `Crypto` only if Argon2 itself fails
pub fn hash_password(password: &str, pepper: Option<&[u8]>) -> Result<String> {
    let salt = generate_spice(SALT_LENGTH)?;
    hash_password_with_salt(password.as_bytes(), &salt, pepper)
}

/// Hash a password with a pepper given as base64 text.
///
/// # Errors
/// - Returns `InvalidInput` if the pepper is not valid base64
pub fn hash_password_b64_pepper(password: &str, pepper_b64: &str) -> Result<String> {
    let pepper = Pepper::from_base64(pepper_b64)?;
    hash_password(password, Some(pepper.as_bytes()))
}

/// Hash password bytes with an explicit salt.
///
/// Deterministic given the same inputs. [`hash_password`] and [`verify`] are
/// both built on this.
///
/// # Errors
/// - Returns `InvalidInput` if the salt is shorter than MIN_SALT_LENGTH
pub fn hash_password_with_salt(
    password: &[u8],
    salt: &[u8],
    pepper: Option<&[u8]>,
) -> Result<String> {
    let digest = derive_digest(password, salt, pepper)?;
    Ok(HashedCredential::encode(&digest[..], salt))
}

/// Check a candidate password against a stored credential.
///
/// A wrong password or a mismatched pepper (missing, different, or present
/// when none was used) yields `Ok(false)`. Only a structurally broken stored
/// string is an error.
///
/// # Errors
/// - Returns `MalformedHash` if `hashed` cannot be split into digest and salt
///
/// # Security
/// - The recomputed and stored digests are compared in constant time
pub fn verify(hashed: &str, password: &str, pepper: Option<&[u8]>) -> Result<bool> {
    let credential = match HashedCredential::parse(hashed) {
        Ok(credential) => credential,
        Err(e) => {
            warn!(error = %e, "Rejected malformed stored hash");
            return Err(e);
        }
    };

    let digest = derive_digest(password.as_bytes(), credential.salt(), pepper)?;
    let recomputed = STANDARD.encode(&digest[..]);
    let matched: bool = recomputed
        .as_bytes()
        .ct_eq(credential.digest_b64().as_bytes())
        .into();
    debug!(matched, peppered = pepper.is_some(), "Verified password");

    Ok(matched)
}

/// Check a candidate password using a pepper given as base64 text.
///
/// # Errors
/// - Returns `InvalidInput` if the pepper is not valid base64
/// - Returns `MalformedHash` if `hashed` cannot be split into digest and salt
pub fn verify_b64_pepper(hashed: &str, password: &str, pepper_b64: &str) -> Result<bool> {
    let pepper = Pepper::from_base64(pepper_b64)?;
    verify(hashed, password, Some(pepper.as_bytes()))
}

/// Hashing and verification behind a single bound configuration.
pub trait CredentialHasher {
    /// Hash a password into a storable credential string.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a password against a stored credential string.
    fn verify(&self, password: &str, hashed: &str) -> Result<bool>;
}

/// Password hasher with the pepper bound once.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    pepper: Option<Pepper>,
}

impl PasswordHasher {
    /// Create a hasher with an optional pepper.
    pub fn new(pepper: Option<Pepper>) -> Self {
        Self { pepper }
    }

    /// Create a hasher that uses `pepper` for every call.
    pub fn with_pepper(pepper: Pepper) -> Self {
        Self::new(Some(pepper))
    }

    /// Create a hasher from a base64 pepper.
    pub fn from_base64_pepper(pepper_b64: &str) -> Result<Self> {
        Ok(Self::with_pepper(Pepper::from_base64(pepper_b64)?))
    }

    /// Whether a pepper is bound.
    pub fn has_pepper(&self) -> bool {
        self.pepper.is_some()
    }

    fn pepper_bytes(&self) -> Option<&[u8]> {
        self.pepper.as_ref().map(Pepper::as_bytes)
    }
}

impl CredentialHasher for PasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        hash_password(password, self.pepper_bytes())
    }

    fn verify(&self, password: &str, hashed: &str) -> Result<bool> {
        verify(hashed, password, self.pepper_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::DIGEST_LENGTH;
    use proptest::prelude::*;

    const SECRET: &str = "Hunter2";
    const BAD_SECRET: &str = "Hunter3";

    fn pepper() -> Vec<u8> {
        generate_spice(DEFAULT_SPICE_SIZE).unwrap()
    }

    #[test]
    fn test_verify_without_pepper() {
        let hashed = hash_password(SECRET, None).unwrap();
        assert!(verify(&hashed, SECRET, None).unwrap());
    }

    #[test]
    fn test_verify_with_pepper() {
        let pepper = pepper();
        let hashed = hash_password(SECRET, Some(&pepper)).unwrap();

        assert!(verify(&hashed, SECRET, Some(&pepper)).unwrap());
        assert!(!verify(&hashed, BAD_SECRET, Some(&pepper)).unwrap());
    }

    #[test]
    fn test_hash_twice_differs_but_both_verify() {
        let first = hash_password(SECRET, None).unwrap();
        let second = hash_password(SECRET, None).unwrap();

        assert_ne!(first, second);
        assert!(verify(&first, SECRET, None).unwrap());
        assert!(verify(&second, SECRET, None).unwrap());
    }

    #[test]
    fn test_missing_pepper_does_not_verify() {
        let pepper = pepper();
        let hashed = hash_password(SECRET, Some(&pepper)).unwrap();

        assert!(!verify(&hashed, SECRET, None).unwrap());
    }

    #[test]
    fn test_unexpected_pepper_does_not_verify() {
        let hashed = hash_password(SECRET, None).unwrap();

        assert!(!verify(&hashed, SECRET, Some(&pepper())).unwrap());
    }

    #[test]
    fn test_wrong_pepper_does_not_verify() {
        let hashed = hash_password(SECRET, Some(&[1u8; 32])).unwrap();

        assert!(!verify(&hashed, SECRET, Some(&[2u8; 32])).unwrap());
    }

    #[test]
    fn test_empty_password() {
        let hashed = hash_password("", None).unwrap();

        assert!(verify(&hashed, "", None).unwrap());
        assert!(!verify(&hashed, " ", None).unwrap());
    }

    #[test]
    fn test_encoded_segment_lengths() {
        let hashed = hash_password(SECRET, Some(&pepper())).unwrap();
        let (digest, salt) = hashed.split_once(SALT_DELIMITER).unwrap();

        assert_eq!(STANDARD.decode(digest).unwrap().len(), DIGEST_LENGTH);
        assert_eq!(STANDARD.decode(salt).unwrap().len(), SALT_LENGTH);
    }

    #[test]
    fn test_hash_with_salt_deterministic() {
        let salt = [5u8; SALT_LENGTH];

        let first = hash_password_with_salt(b"password", &salt, Some(b"pepper")).unwrap();
        let second = hash_password_with_salt(b"password", &salt, Some(b"pepper")).unwrap();

        assert_eq!(first, second);
        assert!(first.ends_with(&STANDARD.encode(salt)));
        assert!(verify(&first, "password", Some(b"pepper")).unwrap());
    }

    #[test]
    fn test_hash_with_short_salt_fails() {
        let result = hash_password_with_salt(b"password", b"short", None);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_verify_without_delimiter_is_malformed() {
        let result = verify("qpwoeiweporiuoqweiur", SECRET, None);
        assert!(matches!(result, Err(Error::MalformedHash(_))));
    }

    #[test]
    fn test_verify_digest_only_is_malformed() {
        let hashed = hash_password(SECRET, Some(&pepper())).unwrap();
        let (digest, _) = hashed.split_once(SALT_DELIMITER).unwrap();

        let result = verify(digest, SECRET, None);
        assert!(matches!(result, Err(Error::MalformedHash(_))));
    }

    #[test]
    fn test_verify_empty_segments_are_malformed() {
        let salt = STANDARD.encode([1u8; SALT_LENGTH]);

        assert!(matches!(
            verify(&format!(".{}", salt), SECRET, None),
            Err(Error::MalformedHash(_))
        ));
        assert!(matches!(
            verify("abcd.", SECRET, None),
            Err(Error::MalformedHash(_))
        ));
        assert!(matches!(verify("", SECRET, None), Err(Error::MalformedHash(_))));
    }

    #[test]
    fn test_verify_bad_salt_base64_is_malformed() {
        let result = verify("abcd.not*base64", SECRET, None);
        assert!(matches!(result, Err(Error::MalformedHash(_))));
    }

    #[test]
    fn test_verify_short_salt_is_malformed() {
        // "AAAA" decodes to 3 bytes, below the Argon2 minimum.
        let result = verify("abcd.AAAA", SECRET, None);
        assert!(matches!(result, Err(Error::MalformedHash(_))));
    }

    #[test]
    fn test_verify_other_delimiter_is_malformed() {
        let hashed = hash_password(SECRET, None).unwrap();
        let dollar = hashed.replace(SALT_DELIMITER, "$");

        assert!(matches!(
            verify(&dollar, SECRET, None),
            Err(Error::MalformedHash(_))
        ));
    }

    #[test]
    fn test_verify_tampered_digest_is_false() {
        let hashed = hash_password(SECRET, None).unwrap();
        let credential = HashedCredential::parse(&hashed).unwrap();
        let tampered = format!(
            "{}{}{}",
            STANDARD.encode([0u8; DIGEST_LENGTH]),
            SALT_DELIMITER,
            STANDARD.encode(credential.salt())
        );

        assert!(!verify(&tampered, SECRET, None).unwrap());
    }

    #[test]
    fn test_parse_and_display_roundtrip() {
        let hashed = hash_password(SECRET, None).unwrap();
        let credential = HashedCredential::parse(&hashed).unwrap();

        assert_eq!(credential.salt().len(), SALT_LENGTH);
        assert_eq!(credential.to_string(), hashed);
        assert!(hashed.starts_with(credential.digest_b64()));
    }

    #[test]
    fn test_base64_pepper_variants() {
        let pepper_b64 = crate::spice::generate_base64_spice(DEFAULT_SPICE_SIZE).unwrap();
        let hashed = hash_password_b64_pepper(SECRET, &pepper_b64).unwrap();

        assert!(verify_b64_pepper(&hashed, SECRET, &pepper_b64).unwrap());
        assert!(!verify(&hashed, SECRET, None).unwrap());
    }

    #[test]
    fn test_base64_pepper_invalid() {
        assert!(matches!(
            hash_password_b64_pepper(SECRET, "not base64!"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bound_hasher() {
        let hasher = PasswordHasher::with_pepper(Pepper::generate());
        assert!(hasher.has_pepper());

        let hashed = hasher.hash(SECRET).unwrap();
        assert!(hasher.verify(SECRET, &hashed).unwrap());
        assert!(!hasher.verify(BAD_SECRET, &hashed).unwrap());

        let unpeppered = PasswordHasher::default();
        assert!(!unpeppered.has_pepper());
        assert!(!unpeppered.verify(SECRET, &hashed).unwrap());
    }

    #[test]
    fn test_bound_hasher_matches_free_functions() {
        let pepper = Pepper::generate();
        let hasher = PasswordHasher::with_pepper(pepper.clone());

        let hashed = hash_password(SECRET, Some(pepper.as_bytes())).unwrap();
        assert!(hasher.verify(SECRET, &hashed).unwrap());
    }

    #[test]
    fn test_bound_hasher_from_base64() {
        let pepper = Pepper::generate();
        let hasher = PasswordHasher::from_base64_pepper(&pepper.to_base64()).unwrap();

        let hashed = hasher.hash(SECRET).unwrap();
        assert!(verify(&hashed, SECRET, Some(pepper.as_bytes())).unwrap());
    }

    #[test]
    fn test_hasher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PasswordHasher>();
    }

    proptest! {
        // Argon2 is deliberately slow; keep the case count small.
        #![proptest_config(ProptestConfig::with_cases(4))]

        #[test]
        fn prop_hash_then_verify(
            password in ".{0,32}",
            pepper in proptest::collection::vec(any::<u8>(), 0..48),
        ) {
            let hashed = hash_password(&password, Some(&pepper)).unwrap();
            prop_assert!(verify(&hashed, &password, Some(&pepper)).unwrap());
        }

        #[test]
        fn prop_distinct_pepper_rejected(
            password in ".{0,32}",
            pepper in proptest::collection::vec(any::<u8>(), 1..48),
        ) {
            let hashed = hash_password(&password, Some(&pepper)).unwrap();
            let mut other = pepper.clone();
            other[0] ^= 0x01;
            prop_assert!(!verify(&hashed, &password, Some(&other)).unwrap());
        }
    }
}
