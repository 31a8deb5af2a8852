//! Secret-handling primitives for spicerack.
//!
//! This module provides:
//! - Cryptographically secure random bytes ("spice") for salts and peppers
//! - Salted, optionally peppered password hashing using Argon2id
//! - Symmetric encryption of byte payloads using AES-CBC
//! - Configuration of long-lived pepper and key material
//!
//! # Wire formats
//! - Hashed credential: `BASE64(digest) "." BASE64(salt)`
//! - Encrypted payload: `BASE64(IV || ciphertext)`
//!
//! # Security Guarantees
//! - Peppers, keys and intermediate secrets are zeroized on drop
//! - No password, pepper, key or plaintext is ever logged
//! - Stored credentials are compared in constant time
//!
//! Encrypted payloads are not authenticated; see [`cipher`].

pub mod cipher;
pub mod config;
pub mod kdf;
pub mod keys;
pub mod password;
pub mod spice;

pub use cipher::{
    decrypt, decrypt_bytes, decrypt_string, encrypt, encrypt_bytes, encrypt_string,
    SymmetricCipher, IV_SIZE,
};
pub use config::SecretConfig;
pub use kdf::{derive_digest, HashParams, DIGEST_LENGTH};
pub use keys::{EncryptionKey, KeySize, Pepper};
pub use password::{
    hash_password, hash_password_b64_pepper, hash_password_with_salt, verify, verify_b64_pepper,
    CredentialHasher, HashedCredential, PasswordHasher, SALT_DELIMITER,
};
pub use spice::{generate_base64_spice, generate_spice, DEFAULT_SPICE_SIZE};
