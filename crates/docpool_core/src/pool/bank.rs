//! # Pool Bank
//!
//! One fixed-capacity pool. `used_bytes` is always derived from the
//! residents so it cannot drift from them.

use std::collections::HashMap;

use super::record::{PoolId, Record};
use crate::config::PoolConfig;

/// A named, fixed-capacity container of records.
#[derive(Debug)]
pub struct Pool {
    /// Identity inside the allocator.
    id: PoolId,
    /// Static configuration (name, capacity, routing filters).
    config: PoolConfig,
    /// Resident records by id.
    resident: HashMap<String, Record>,
    /// Highest `used_bytes` observed.
    peak_used: u64,
}

impl Pool {
    /// Creates an empty pool.
    pub(crate) fn new(id: PoolId, config: PoolConfig) -> Self {
        Self {
            id,
            config,
            resident: HashMap::new(),
            peak_used: 0,
        }
    }

    /// Identity of the pool.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Pool name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Static configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Byte budget.
    #[inline]
    #[must_use]
    pub const fn capacity_bytes(&self) -> u64 {
        self.config.capacity_bytes
    }

    /// Whether residents may be moved out under pressure.
    #[inline]
    #[must_use]
    pub const fn is_relocatable(&self) -> bool {
        self.config.relocatable
    }

    /// Sum of resident payload sizes.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.resident.values().map(|r| r.payload_size).sum()
    }

    /// Bytes still available.
    #[must_use]
    pub fn free_bytes(&self) -> u64 {
        self.capacity_bytes().saturating_sub(self.used_bytes())
    }

    /// Highest `used_bytes` observed.
    #[inline]
    #[must_use]
    pub const fn peak_used_bytes(&self) -> u64 {
        self.peak_used
    }

    /// Number of resident records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resident.len()
    }

    /// Whether the pool holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Whether `size` more bytes fit right now.
    #[inline]
    #[must_use]
    pub fn fits(&self, size: u64) -> bool {
        size <= self.free_bytes()
    }

    /// Iterates over resident records (unordered).
    pub fn residents(&self) -> impl Iterator<Item = &Record> {
        self.resident.values()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.resident.contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Record> {
        self.resident.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.resident.get_mut(id)
    }

    /// Stores a record. The caller has already checked `fits`.
    pub(crate) fn insert(&mut self, mut record: Record) {
        debug_assert!(self.fits(record.payload_size), "pool {} over budget", self.name());
        record.owning_pool = self.id;
        self.resident.insert(record.id.clone(), record);
        self.peak_used = self.peak_used.max(self.used_bytes());
    }

    pub(crate) fn take(&mut self, id: &str) -> Option<Record> {
        self.resident.remove(id)
    }

    /// Ids of stale, low-priority, non-critical residents.
    pub(crate) fn garbage(&self, now: u64, staleness_ms: u64, priority_floor: u8) -> Vec<String> {
        self.resident
            .values()
            .filter(|r| {
                !r.is_pinned()
                    && r.priority < priority_floor
                    && now.saturating_sub(r.last_accessed) > staleness_ms
            })
            .map(|r| r.id.clone())
            .collect()
    }

    /// Non-critical residents not outranking `ceiling`, cheapest first.
    pub(crate) fn eviction_order(&self, ceiling: u8) -> Vec<&Record> {
        let mut candidates: Vec<&Record> = self
            .resident
            .values()
            .filter(|r| !r.is_pinned() && r.priority <= ceiling)
            .collect();
        candidates.sort_unstable_by_key(|r| r.eviction_key());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::{Attributes, Category, Urgency};

    fn record(id: &str, urgency: Urgency, size: u64, priority: u8, last: u64, seq: u64) -> Record {
        Record {
            id: id.to_string(),
            attributes: Attributes::new(Category::Brief, urgency, 0.0),
            payload_size: size,
            priority,
            last_accessed: last,
            owning_pool: PoolId(0),
            access_seq: seq,
        }
    }

    fn pool(capacity: u64) -> Pool {
        Pool::new(PoolId(0), PoolConfig::new("p", capacity, true))
    }

    #[test]
    fn test_used_bytes_tracks_residents() {
        let mut p = pool(100);
        p.insert(record("a", Urgency::Low, 30, 64, 0, 0));
        p.insert(record("b", Urgency::Low, 50, 64, 0, 1));
        assert_eq!(p.used_bytes(), 80);
        assert_eq!(p.free_bytes(), 20);
        assert!(p.fits(20));
        assert!(!p.fits(21));

        p.take("a");
        assert_eq!(p.used_bytes(), 50);
        assert_eq!(p.peak_used_bytes(), 80);
    }

    #[test]
    fn test_eviction_order_priority_then_age() {
        let mut p = pool(1000);
        p.insert(record("young_low", Urgency::Low, 1, 64, 50, 3));
        p.insert(record("old_low", Urgency::Low, 1, 64, 10, 1));
        p.insert(record("old_mid", Urgency::Medium, 1, 128, 0, 0));
        p.insert(record("critical", Urgency::Critical, 1, 10, 0, 2));

        let order: Vec<&str> = p.eviction_order(255).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["old_low", "young_low", "old_mid"]);

        let capped: Vec<&str> = p.eviction_order(100).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(capped, vec!["old_low", "young_low"]);
    }

    #[test]
    fn test_garbage_rule() {
        let mut p = pool(1000);
        p.insert(record("stale_low", Urgency::Low, 1, 64, 0, 0));
        p.insert(record("fresh_low", Urgency::Low, 1, 64, 900, 1));
        p.insert(record("stale_high", Urgency::High, 1, 200, 0, 2));
        p.insert(record("stale_critical", Urgency::Critical, 1, 0, 0, 3));

        let garbage = p.garbage(1000, 500, 128);
        assert_eq!(garbage, vec!["stale_low".to_string()]);
    }
}
