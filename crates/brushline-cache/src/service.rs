//! The tiered cache service
//!
//! Lookup walks memory, then the persisted tier, then computes. A
//! persisted hit is promoted into memory on the way out. Concurrent
//! misses on one key coalesce into a single computation. Storage
//! failures in the persisted tier never fail a fetch; they are logged
//! and the service degrades to recomputing.

use crate::error::CacheResult;
use crate::inflight::{FlightRole, InflightMap, WaitOutcome};
use crate::key::CacheKey;
use crate::memory::MemoryTier;
use crate::persist::SqliteTier;
use brushline_estimate::CalculationResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Tuning knobs for [`CalculationCache`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entries held in memory
    pub memory_capacity: usize,
    /// Memory entry lifetime; `None` keeps entries until evicted
    pub memory_ttl: Option<Duration>,
    /// Persisted row lifetime; `None` keeps rows until trimmed
    pub persisted_ttl: Option<Duration>,
    /// How long a fetch waits on another caller's in-flight computation
    /// before abandoning and computing independently; `None` waits as
    /// long as the computation takes
    pub follower_wait: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 256,
            memory_ttl: None,
            persisted_ttl: None,
            follower_wait: None,
        }
    }
}

/// A point-in-time view of cache effectiveness counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub persisted_hits: u64,
    pub misses: u64,
    /// Fetches that waited on another caller's computation
    pub coalesced: u64,
}

/// Multi-tier cache over calculation results
pub struct CalculationCache {
    memory: Mutex<MemoryTier>,
    persisted: Option<SqliteTier>,
    inflight: InflightMap,
    config: CacheConfig,
    memory_hits: AtomicU64,
    persisted_hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

impl CalculationCache {
    /// Memory-only cache
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Memory backed by a persisted SQLite tier
    pub fn with_persistence(config: CacheConfig, tier: SqliteTier) -> Self {
        Self::build(config, Some(tier))
    }

    fn build(config: CacheConfig, persisted: Option<SqliteTier>) -> Self {
        Self {
            memory: Mutex::new(MemoryTier::new(config.memory_capacity)),
            persisted,
            inflight: InflightMap::new(),
            config,
            memory_hits: AtomicU64::new(0),
            persisted_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Fetch the result for `key`, computing it on a miss
    ///
    /// Concurrent fetches of the same key run `compute` once; the other
    /// callers block and share the leader's result.
    pub fn fetch<F>(
        &self,
        key: &CacheKey,
        tag: Option<&str>,
        compute: F,
    ) -> CacheResult<Arc<CalculationResult>>
    where
        F: FnOnce() -> CacheResult<CalculationResult>,
    {
        if let Some(hit) = self.memory_get(key.as_str()) {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        match self.inflight.begin(key.as_str()) {
            FlightRole::Follower(flight) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                let outcome = match self.config.follower_wait {
                    Some(timeout) => match InflightMap::wait_timeout(&flight, timeout) {
                        WaitOutcome::Done(outcome) => outcome,
                        WaitOutcome::TimedOut => {
                            log::debug!("abandoning wait on in-flight computation for {key}");
                            return self.compute_and_store(key, tag, compute);
                        }
                    },
                    None => InflightMap::wait(&flight),
                };
                match outcome {
                    Some(shared) => Ok(shared),
                    // The leader failed; compute independently rather
                    // than returning its opaque failure.
                    None => self.compute_and_store(key, tag, compute),
                }
            }
            FlightRole::Leader(lease) => {
                if let Some(persisted) = self.persisted_get(key.as_str()) {
                    self.persisted_hits.fetch_add(1, Ordering::Relaxed);
                    self.memory_put(key.as_str(), tag, Arc::clone(&persisted));
                    lease.complete(Some(Arc::clone(&persisted)));
                    return Ok(persisted);
                }

                self.misses.fetch_add(1, Ordering::Relaxed);
                match self.compute_and_store(key, tag, compute) {
                    Ok(value) => {
                        lease.complete(Some(Arc::clone(&value)));
                        Ok(value)
                    }
                    Err(err) => {
                        lease.complete(None);
                        Err(err)
                    }
                }
            }
        }
    }

    /// Drop every entry carrying `tag` from both tiers
    pub fn invalidate_tag(&self, tag: &str) {
        self.memory_lock().invalidate_tag(tag);
        if let Some(tier) = &self.persisted {
            if let Err(err) = tier.invalidate_tag(tag) {
                log::warn!("persisted tier tag invalidation failed for '{tag}': {err}");
            }
        }
    }

    /// Drop everything from both tiers
    pub fn clear(&self) {
        self.memory_lock().clear();
        if let Some(tier) = &self.persisted {
            if let Err(err) = tier.clear() {
                log::warn!("persisted tier clear failed: {err}");
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persisted_hits: self.persisted_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }

    fn compute_and_store<F>(
        &self,
        key: &CacheKey,
        tag: Option<&str>,
        compute: F,
    ) -> CacheResult<Arc<CalculationResult>>
    where
        F: FnOnce() -> CacheResult<CalculationResult>,
    {
        let value = Arc::new(compute()?);
        if let Some(tier) = &self.persisted {
            if let Err(err) = tier.put(key.as_str(), tag, &value, self.config.persisted_ttl) {
                log::warn!("persisted tier write failed for {key}: {err}");
            }
        }
        self.memory_put(key.as_str(), tag, Arc::clone(&value));
        Ok(value)
    }

    fn memory_get(&self, key: &str) -> Option<Arc<CalculationResult>> {
        self.memory_lock().get(key)
    }

    fn memory_put(&self, key: &str, tag: Option<&str>, value: Arc<CalculationResult>) {
        self.memory_lock().put(
            key.to_string(),
            value,
            tag.map(str::to_string),
            self.config.memory_ttl,
        );
    }

    fn memory_lock(&self) -> std::sync::MutexGuard<'_, MemoryTier> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persisted_get(&self, key: &str) -> Option<Arc<CalculationResult>> {
        let tier = self.persisted.as_ref()?;
        match tier.get(key) {
            Ok(found) => found.map(Arc::new),
            Err(err) => {
                log::warn!("persisted tier read failed for {key}, recomputing: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brushline_estimate::{
        CalculationInput, Estimator, MaterialGrade, Room, Season, Surface, Urgency,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    fn input() -> CalculationInput {
        CalculationInput {
            rooms: vec![Room {
                name: "Office".into(),
                length: Decimal::from(14),
                width: Decimal::from(11),
                height: Decimal::from(9),
                doors: 1,
                windows: 2,
                complexity: 2,
                surfaces: vec![Surface::Walls, Surface::Ceiling],
            }],
            material: MaterialGrade::Premium,
            coats: 2,
            urgency: Urgency::Standard,
            season: Season::Standard,
            discount_percent: Decimal::ZERO,
        }
    }

    fn computed(key: &CacheKey) -> CacheResult<CalculationResult> {
        Ok(Estimator::new().calculate(&input(), key.as_str())?)
    }

    #[test]
    fn second_fetch_hits_memory() {
        let cache = CalculationCache::new(CacheConfig::default());
        let key = CacheKey::for_input(&input()).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .fetch(&key, None, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    computed(&key)
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_hits, 2);
    }

    #[test]
    fn persisted_hit_skips_compute_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let key = CacheKey::for_input(&input()).unwrap();

        {
            let cache = CalculationCache::with_persistence(
                CacheConfig::default(),
                SqliteTier::open(&path).unwrap(),
            );
            cache.fetch(&key, None, || computed(&key)).unwrap();
        }

        // A fresh process with an empty memory tier.
        let cache = CalculationCache::with_persistence(
            CacheConfig::default(),
            SqliteTier::open(&path).unwrap(),
        );
        let calls = AtomicUsize::new(0);
        cache
            .fetch(&key, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                computed(&key)
            })
            .unwrap();
        cache.fetch(&key, None, || computed(&key)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let stats = cache.stats();
        assert_eq!(stats.persisted_hits, 1);
        assert_eq!(stats.memory_hits, 1);
    }

    #[test]
    fn concurrent_fetches_compute_once() {
        let cache = CalculationCache::new(CacheConfig::default());
        let key = CacheKey::for_input(&input()).unwrap();
        let calls = AtomicUsize::new(0);
        let threads = 8;
        let barrier = Barrier::new(threads);

        thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    barrier.wait();
                    cache
                        .fetch(&key, None, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            computed(&key)
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bounded_wait_falls_back_to_computing() {
        let cache = CalculationCache::new(CacheConfig {
            follower_wait: Some(Duration::from_millis(10)),
            ..CacheConfig::default()
        });
        let key = CacheKey::for_input(&input()).unwrap();
        let calls = AtomicUsize::new(0);
        let leader_running = Barrier::new(2);

        thread::scope(|scope| {
            let slow = scope.spawn(|| {
                cache.fetch(&key, None, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    leader_running.wait();
                    thread::sleep(Duration::from_millis(200));
                    computed(&key)
                })
            });

            // Enter the fetch only once the first caller is computing,
            // outlast the bounded wait, and compute independently.
            leader_running.wait();
            let fast = cache.fetch(&key, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                computed(&key)
            });

            assert!(fast.is_ok());
            assert!(slow.join().unwrap().is_ok());
        });

        // Both callers computed: the second gave up waiting.
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The slower computation still landed in memory.
        let followups = AtomicUsize::new(0);
        cache
            .fetch(&key, None, || {
                followups.fetch_add(1, Ordering::SeqCst);
                computed(&key)
            })
            .unwrap();
        assert_eq!(followups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_compute_is_not_cached() {
        let cache = CalculationCache::new(CacheConfig::default());
        let mut bad = input();
        bad.coats = 0;
        let key = CacheKey::for_input(&bad).unwrap();

        let err = cache.fetch(&key, None, || {
            Ok(Estimator::new().calculate(&bad, key.as_str())?)
        });
        assert!(err.is_err());

        // The failure left nothing behind; a good compute still runs.
        let calls = AtomicUsize::new(0);
        cache
            .fetch(&key, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                computed(&key)
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tag_invalidation_forces_recompute() {
        let cache = CalculationCache::with_persistence(
            CacheConfig::default(),
            SqliteTier::in_memory().unwrap(),
        );
        let key = CacheKey::for_input(&input()).unwrap();

        cache.fetch(&key, Some("rates-v1"), || computed(&key)).unwrap();
        cache.invalidate_tag("rates-v1");

        let calls = AtomicUsize::new(0);
        cache
            .fetch(&key, Some("rates-v2"), || {
                calls.fetch_add(1, Ordering::SeqCst);
                computed(&key)
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
