//! Explosion cache: memoized per-part requirement subtrees, keyed on
//! `(part, target serial)` and shared across the demands of one run.

use chrono::{DateTime, Utc};
use mrp_core::{GrossRequirement, PartNumber, SerialEffectivity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache key. The target serial is held as a degenerate `[target, target]`
/// range; the cache is only ever consulted with a concrete serial, so the
/// range carries no further meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub part_number: PartNumber,
    pub effectivity: SerialEffectivity,
}

impl CacheKey {
    pub fn new(part_number: &PartNumber, target_serial: &str) -> Self {
        Self {
            part_number: part_number.clone(),
            effectivity: SerialEffectivity::point(target_serial),
        }
    }
}

/// Explosion subtree produced by a unit demand (quantity 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedExplosion {
    pub requirements: Vec<GrossRequirement>,
    pub lead_time_days: u32,
    pub computed_at: DateTime<Utc>,
}

/// Readers-writer cache over explosion subtrees.
///
/// Any number of concurrent readers, one exclusive writer; eviction runs
/// under the writer lock. With a non-zero `max_entries`, inserting past the
/// cap evicts the entry with the oldest `computed_at` (ties arbitrary).
pub struct ExplosionCache {
    entries: RwLock<HashMap<CacheKey, CachedExplosion>>,
    max_entries: usize,
}

impl ExplosionCache {
    /// Unbounded cache
    pub fn new() -> Self {
        Self::with_max_entries(0)
    }

    /// `max_entries` of 0 disables the cap
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    pub fn get(&self, part_number: &PartNumber, target_serial: &str) -> Option<CachedExplosion> {
        let entries = self.entries.read().unwrap();
        entries.get(&CacheKey::new(part_number, target_serial)).cloned()
    }

    /// Store the unit-scaled subtree for `(part, target_serial)`, stamping
    /// the entry with the current time.
    pub fn insert(
        &self,
        part_number: &PartNumber,
        target_serial: &str,
        requirements: Vec<GrossRequirement>,
        lead_time_days: u32,
    ) {
        self.insert_entry(
            CacheKey::new(part_number, target_serial),
            CachedExplosion {
                requirements,
                lead_time_days,
                computed_at: Utc::now(),
            },
        );
    }

    /// Store a fully formed entry (snapshot restore, tests).
    pub fn insert_entry(&self, key: CacheKey, entry: CachedExplosion) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(key, entry);

        if self.max_entries > 0 {
            while entries.len() > self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, cached)| cached.computed_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => entries.remove(&key),
                    None => break,
                };
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Clone the current entries; attached to the planning result.
    pub fn snapshot(&self) -> Vec<(CacheKey, CachedExplosion)> {
        let entries = self.entries.read().unwrap();
        entries
            .iter()
            .map(|(key, cached)| (key.clone(), cached.clone()))
            .collect()
    }
}

impl Default for ExplosionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn unit_req(part: &str) -> GrossRequirement {
        GrossRequirement {
            part_number: PartNumber::new(part),
            quantity: 1,
            need_date: Utc::now(),
            demand_trace: part.to_string(),
            location: "FACTORY".to_string(),
            target_serial: "SN001".to_string(),
        }
    }

    fn entry_at(age_days: i64) -> CachedExplosion {
        CachedExplosion {
            requirements: vec![unit_req("X")],
            lead_time_days: 3,
            computed_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ExplosionCache::new();
        let part = PartNumber::new("ASSEMBLY_A");

        assert!(cache.get(&part, "SN001").is_none());

        cache.insert(&part, "SN001", vec![unit_req("ASSEMBLY_A")], 5);

        let hit = cache.get(&part, "SN001").unwrap();
        assert_eq!(hit.lead_time_days, 5);
        assert_eq!(hit.requirements.len(), 1);

        // A different target serial is a different key
        assert!(cache.get(&part, "SN002").is_none());
    }

    #[test]
    fn test_key_is_a_point_range() {
        let key = CacheKey::new(&PartNumber::new("A"), "AS505");
        assert_eq!(key.effectivity.from_serial, "AS505");
        assert_eq!(key.effectivity.to_serial, "AS505");
    }

    #[test]
    fn test_eviction_removes_oldest() {
        let cache = ExplosionCache::with_max_entries(2);
        let a = PartNumber::new("A");
        let b = PartNumber::new("B");
        let c = PartNumber::new("C");

        cache.insert_entry(CacheKey::new(&a, "S1"), entry_at(10));
        cache.insert_entry(CacheKey::new(&b, "S1"), entry_at(5));
        cache.insert_entry(CacheKey::new(&c, "S1"), entry_at(1));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a, "S1").is_none());
        assert!(cache.get(&b, "S1").is_some());
        assert!(cache.get(&c, "S1").is_some());
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        let cache = ExplosionCache::new();
        for i in 0..100 {
            let part = PartNumber::new(format!("P{i}"));
            cache.insert(&part, "S1", vec![], 0);
        }
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_snapshot_clones_entries() {
        let cache = ExplosionCache::new();
        let part = PartNumber::new("A");
        cache.insert(&part, "S1", vec![unit_req("A")], 2);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(snapshot.len(), 1);
    }
}
