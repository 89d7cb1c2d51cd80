//! In-memory cache tier
//!
//! A bounded map of recently used results. Eviction is least recently
//! used, tracked with a monotonic access tick rather than timestamps so
//! ordering is exact. Entries can carry a TTL; expiry is checked lazily
//! on read.

use ahash::AHashMap;
use brushline_estimate::CalculationResult;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry {
    value: Arc<CalculationResult>,
    tag: Option<String>,
    expires_at: Option<Instant>,
    last_used: u64,
}

/// Bounded LRU map of calculation results
pub struct MemoryTier {
    entries: AHashMap<String, Entry>,
    capacity: usize,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Fetch a live entry, refreshing its recency
    pub fn get(&mut self, key: &str) -> Option<Arc<CalculationResult>> {
        self.tick += 1;
        let tick = self.tick;

        let expired = match self.entries.get_mut(key) {
            Some(entry) => {
                if entry.expires_at.is_some_and(|at| Instant::now() >= at) {
                    true
                } else {
                    entry.last_used = tick;
                    self.hits += 1;
                    return Some(Arc::clone(&entry.value));
                }
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        self.misses += 1;
        None
    }

    /// Insert an entry, evicting the least recently used if full
    pub fn put(
        &mut self,
        key: String,
        value: Arc<CalculationResult>,
        tag: Option<String>,
        ttl: Option<Duration>,
    ) {
        self.tick += 1;
        let entry = Entry {
            value,
            tag,
            expires_at: ttl.map(|d| Instant::now() + d),
            last_used: self.tick,
        };
        self.entries.insert(key, entry);

        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    self.entries.remove(&k);
                }
                None => break,
            }
        }
    }

    /// Drop every entry carrying `tag`
    pub fn invalidate_tag(&mut self, tag: &str) {
        self.entries
            .retain(|_, e| e.tag.as_deref() != Some(tag));
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
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

    fn result(seed: u32) -> Arc<CalculationResult> {
        let input = CalculationInput {
            rooms: vec![Room {
                name: format!("Room {seed}"),
                length: Decimal::from(10 + seed),
                width: Decimal::from(10),
                height: Decimal::from(8),
                doors: 0,
                windows: 0,
                complexity: 1,
                surfaces: vec![Surface::Walls],
            }],
            material: MaterialGrade::Basic,
            coats: 1,
            urgency: Urgency::Standard,
            season: Season::Standard,
            discount_percent: Decimal::ZERO,
        };
        Arc::new(Estimator::new().calculate(&input, format!("k{seed}")).unwrap())
    }

    #[test]
    fn get_returns_what_was_put() {
        let mut tier = MemoryTier::new(4);
        tier.put("a".into(), result(1), None, None);

        let got = tier.get("a").unwrap();
        assert_eq!(got.cache_key, "k1");
        assert_eq!(tier.hits(), 1);
        assert_eq!(tier.misses(), 0);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut tier = MemoryTier::new(2);
        tier.put("a".into(), result(1), None, None);
        tier.put("b".into(), result(2), None, None);
        tier.get("a");
        tier.put("c".into(), result(3), None, None);

        assert!(tier.get("a").is_some());
        assert!(tier.get("b").is_none());
        assert!(tier.get("c").is_some());
    }

    #[test]
    fn expired_entries_miss() {
        let mut tier = MemoryTier::new(4);
        tier.put("a".into(), result(1), None, Some(Duration::ZERO));
        assert!(tier.get("a").is_none());
        assert_eq!(tier.misses(), 1);
        assert!(tier.is_empty());
    }

    #[test]
    fn tag_invalidation_is_selective() {
        let mut tier = MemoryTier::new(4);
        tier.put("a".into(), result(1), Some("rates-v1".into()), None);
        tier.put("b".into(), result(2), None, None);

        tier.invalidate_tag("rates-v1");
        assert!(tier.get("a").is_none());
        assert!(tier.get("b").is_some());
    }
}
