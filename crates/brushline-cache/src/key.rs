//! Content-addressed cache keys
//!
//! A key is the SHA-256 of the canonicalized input's JSON encoding.
//! Canonicalization happens first, so two inputs that differ only in
//! room or surface ordering hash identically; any semantic change to
//! the input produces a different key.

use crate::error::CacheResult;
use brushline_estimate::CalculationInput;
use sha2::{Digest, Sha256};
use std::fmt::{self, Write};

/// A deterministic content hash identifying one calculation input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an input
    pub fn for_input(input: &CalculationInput) -> CacheResult<CacheKey> {
        let canonical = input.canonicalize();
        let encoded = serde_json::to_vec(&canonical)?;
        let digest = Sha256::digest(&encoded);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            // Writing hex into a String cannot fail.
            let _ = write!(hex, "{byte:02x}");
        }
        Ok(CacheKey(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
