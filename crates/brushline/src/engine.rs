//! The estimate engine
//!
//! [`EstimateEngine`] is the front door: it validates input, derives
//! the content-addressed cache key, and serves the result through the
//! tiered cache, computing only on a genuine miss. Batched quoting
//! fans out through the [`BatchScheduler`].

use brushline_cache::{
    BatchScheduler, CacheConfig, CacheError, CacheKey, CacheStats, CalculationCache, SqliteTier,
};
use brushline_estimate::{CalculationInput, CalculationResult, Estimator, ValidationError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by [`EstimateEngine`]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input failed validation before any calculation ran
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Key derivation or cache plumbing failed
    #[error("cache failure: {0}")]
    Cache(CacheError),
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Validation(inner) => EngineError::Validation(inner),
            other => EngineError::Cache(other),
        }
    }
}

/// Calculates and caches painting estimates
pub struct EstimateEngine {
    estimator: Estimator,
    cache: CalculationCache,
    tag: Option<String>,
}

impl EstimateEngine {
    /// An engine with an in-memory cache only
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            estimator: Estimator::new(),
            cache: CalculationCache::new(config),
            tag: None,
        }
    }

    /// An engine whose cache also persists results to a SQLite file
    pub fn with_persistence(config: CacheConfig, path: &Path) -> Result<Self, EngineError> {
        let tier = SqliteTier::open(path).map_err(EngineError::Cache)?;
        Ok(Self {
            estimator: Estimator::new(),
            cache: CalculationCache::with_persistence(config, tier),
            tag: None,
        })
    }

    /// Tag every cached entry, enabling group invalidation when the
    /// underlying rates change
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Quote one estimate, served from cache when possible
    pub fn calculate(
        &self,
        input: &CalculationInput,
    ) -> Result<Arc<CalculationResult>, EngineError> {
        input.validate()?;
        let key = CacheKey::for_input(input).map_err(EngineError::from)?;

        let result = self.cache.fetch(&key, self.tag.as_deref(), || {
            log::debug!("cache miss, computing estimate for {key}");
            Ok(self.estimator.calculate(input, key.as_str())?)
        })?;
        Ok(result)
    }

    /// Quote a batch of estimates in bounded parallel batches
    ///
    /// Results come back in input order. Duplicate inputs within one
    /// batch coalesce into a single computation.
    pub fn calculate_many(
        &self,
        inputs: Vec<CalculationInput>,
        scheduler: &BatchScheduler,
    ) -> Vec<Result<Arc<CalculationResult>, EngineError>> {
        scheduler.run(inputs, |input| self.calculate(&input))
    }

    /// Drop every cached entry carrying `tag`
    pub fn invalidate_tag(&self, tag: &str) {
        self.cache.invalidate_tag(tag);
    }

    /// Drop everything from the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for EstimateEngine {
    fn default() -> Self {
        Self::new()
    }
}
