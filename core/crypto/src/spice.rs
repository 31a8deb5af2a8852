//! Cryptographically secure random bytes ("spice").
//!
//! Spice is the raw material for salts, peppers, keys and IVs. Every call
//! draws fresh bytes from the operating system's CSPRNG; there is no seeding
//! API and no caching. A failing OS entropy source aborts the call with a
//! panic, since nothing downstream can be trusted without it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use spicerack_common::{Error, Result};

/// Default spice size in bytes (256-bit).
pub const DEFAULT_SPICE_SIZE: usize = 32;

/// Generate `size` random bytes.
///
/// # Errors
/// - Returns `InvalidInput` if `size` is zero
pub fn generate_spice(size: usize) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(Error::InvalidInput(
            "Spice size must be greater than zero".to_string(),
        ));
    }

    let mut spice = vec![0u8; size];
    OsRng.fill_bytes(&mut spice);
    debug!(size, "Generated spice");

    Ok(spice)
}

/// Generate `size` random bytes and return them as standard base64.
///
/// Useful for producing a printable pepper or key to place in configuration.
pub fn generate_base64_spice(size: usize) -> Result<String> {
    let spice = generate_spice(size)?;
    Ok(STANDARD.encode(spice))
}

/// Fixed-size spice for IVs and generated keys.
pub(crate) fn generate_array<const N: usize>() -> [u8; N] {
    let mut spice = [0u8; N];
    OsRng.fill_bytes(&mut spice);
    spice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_spice_length() {
        assert_eq!(generate_spice(DEFAULT_SPICE_SIZE).unwrap().len(), 32);
        assert_eq!(generate_spice(1).unwrap().len(), 1);
        assert_eq!(generate_spice(100).unwrap().len(), 100);
    }

    #[test]
    fn test_generate_spice_zero_fails() {
        assert!(matches!(generate_spice(0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_generate_spice_unique() {
        let a = generate_spice(DEFAULT_SPICE_SIZE).unwrap();
        let b = generate_spice(DEFAULT_SPICE_SIZE).unwrap();

        // Random spice should differ
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_base64_spice_decodes_to_size() {
        let encoded = generate_base64_spice(DEFAULT_SPICE_SIZE).unwrap();
        let decoded = STANDARD.decode(&encoded).unwrap();
        assert_eq!(decoded.len(), DEFAULT_SPICE_SIZE);
    }

    #[test]
    fn test_generate_base64_spice_zero_fails() {
        assert!(generate_base64_spice(0).is_err());
    }

    #[test]
    fn test_generate_array_unique() {
        let a: [u8; 16] = generate_array();
        let b: [u8; 16] = generate_array();
        assert_ne!(a, b);
    }
}
