//! Cache error types

use brushline_estimate::ValidationError;
use thiserror::Error;

/// Failures while reading or writing cache tiers, or while computing a
/// value on a miss
#[derive(Debug, Error)]
pub enum CacheError {
    /// A payload could not be serialized or deserialized
    #[error("cache payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted tier's storage failed
    #[error("persisted cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The computation behind a miss rejected its input
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
