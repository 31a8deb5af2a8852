//! Common utilities and types shared across spicerack crates.
//!
//! This module provides the error taxonomy and the zeroizing byte wrapper
//! used by the hashing and encryption primitives.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::SensitiveBytes;
