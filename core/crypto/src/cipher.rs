//! Symmetric encryption using AES in CBC mode with PKCS#7 padding.
//!
//! The payload layout is `IV || ciphertext`, with a fresh 16-byte IV per
//! call. The text forms wrap that layout in standard base64.
//!
//! # Limitations
//! CBC carries no authentication tag. A tampered payload is only detected
//! when it happens to break the padding; otherwise it decrypts to altered
//! plaintext. Callers that need integrity must authenticate the payload
//! separately.

use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};
use tracing::debug;
use zeroize::Zeroize;

use crate::keys::{EncryptionKey, KeySize};
use crate::spice::generate_array;
use spicerack_common::{Error, Result};

/// Size of the initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::InvalidInput(format!("Invalid key or IV length: {}", e)))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::InvalidInput(format!("Invalid key or IV length: {}", e)))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            Error::DecryptionFailed("Invalid padding: wrong key or corrupted payload".to_string())
        })
}

/// Encrypt plaintext bytes with AES-CBC.
///
/// # Preconditions
/// - `key` must be 16, 24 or 32 bytes
///
/// # Postconditions
/// - Returns IV || ciphertext
/// - The IV is randomly generated
/// - The ciphertext length is a positive multiple of BLOCK_SIZE
///
/// # Errors
/// - Returns `InvalidInput` if key length is incorrect
pub fn encrypt_bytes(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let size = KeySize::from_len(key.len())?;
    let iv: [u8; IV_SIZE] = generate_array();

    let ciphertext = match size {
        KeySize::Aes128 => cbc_encrypt::<Aes128>(key, &iv, plaintext)?,
        KeySize::Aes192 => cbc_encrypt::<Aes192>(key, &iv, plaintext)?,
        KeySize::Aes256 => cbc_encrypt::<Aes256>(key, &iv, plaintext)?,
    };

    // Prepend IV to ciphertext
    let mut result = Vec::with_capacity(IV_SIZE + ciphertext.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&ciphertext);

    debug!(
        key_bits = size.key_len() * 8,
        plaintext_len = plaintext.len(),
        payload_len = result.len(),
        "Encrypted payload"
    );
    Ok(result)
}

/// Decrypt an `IV || ciphertext` buffer with AES-CBC.
///
/// # Errors
/// - Returns `InvalidInput` if key length is incorrect
/// - Returns `DecryptionFailed` if the buffer is shorter than the IV
/// - Returns `DecryptionFailed` if the ciphertext is empty or not block aligned
/// - Returns `DecryptionFailed` if the padding is invalid (usually a wrong key)
pub fn decrypt_bytes(data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let size = KeySize::from_len(key.len())?;

    if data.len() < IV_SIZE {
        return Err(Error::DecryptionFailed(format!(
            "Payload is {} bytes, shorter than the {}-byte IV",
            data.len(),
            IV_SIZE
        )));
    }

    let (iv, ciphertext) = data.split_at(IV_SIZE);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::DecryptionFailed(format!(
            "Ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }

    let plaintext = match size {
        KeySize::Aes128 => cbc_decrypt::<Aes128>(key, iv, ciphertext)?,
        KeySize::Aes192 => cbc_decrypt::<Aes192>(key, iv, ciphertext)?,
        KeySize::Aes256 => cbc_decrypt::<Aes256>(key, iv, ciphertext)?,
    };

    debug!(
        key_bits = size.key_len() * 8,
        payload_len = data.len(),
        "Decrypted payload"
    );
    Ok(plaintext)
}

/// Encrypt bytes and return the base64 payload.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String> {
    let payload = encrypt_bytes(plaintext, key)?;
    Ok(STANDARD.encode(payload))
}

/// Decrypt a base64 payload into bytes.
///
/// Surrounding whitespace in `payload` is ignored.
///
/// # Errors
/// - Returns `InvalidInput` if key length is incorrect; the key length is
///   checked before the payload is decoded, so this wins over a base64 error
/// - Returns `DecryptionFailed` if `payload` is not valid base64
/// - Otherwise as [`decrypt_bytes`]
pub fn decrypt(payload: &str, key: &[u8]) -> Result<Vec<u8>> {
    KeySize::from_len(key.len())?;
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::DecryptionFailed(format!("Payload is not valid base64: {}", e)))?;
    decrypt_bytes(&data, key)
}

/// Encrypt UTF-8 text and return the base64 payload.
pub fn encrypt_string(plaintext: &str, key: &[u8]) -> Result<String> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt a base64 payload into UTF-8 text.
///
/// # Errors
/// - Returns `DecryptionFailed` if the recovered bytes are not UTF-8
/// - Otherwise as [`decrypt`]
pub fn decrypt_string(payload: &str, key: &[u8]) -> Result<String> {
    let plaintext = decrypt(payload, key)?;
    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        Error::DecryptionFailed("Decrypted payload is not valid UTF-8".to_string())
    })
}

/// Symmetric cipher with the key bound once.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct SymmetricCipher {
    key: EncryptionKey,
}

impl SymmetricCipher {
    /// Create a cipher bound to `key`.
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Create a cipher from a base64 key.
    pub fn from_base64_key(key_b64: &str) -> Result<Self> {
        Ok(Self::new(EncryptionKey::from_base64(key_b64)?))
    }

    /// AES variant in use.
    pub fn key_size(&self) -> KeySize {
        self.key.size()
    }

    /// Encrypt bytes into a base64 payload.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        encrypt(plaintext, self.key.as_bytes())
    }

    /// Decrypt a base64 payload into bytes.
    pub fn decrypt(&self, payload: &str) -> Result<Vec<u8>> {
        decrypt(payload, self.key.as_bytes())
    }

    /// Encrypt text into a base64 payload.
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        encrypt_string(plaintext, self.key.as_bytes())
    }

    /// Decrypt a base64 payload into text.
    pub fn decrypt_string(&self, payload: &str) -> Result<String> {
        decrypt_string(payload, self.key.as_bytes())
    }
}
