//! # Allocation Statistics
//!
//! Read-only snapshots handed to monitoring. Both structures count with
//! plain integers: every allocator is single-threaded, the facade locks.

use serde::{Deserialize, Serialize};

/// Utilisation of one pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool name.
    pub name: String,
    /// Bytes held by residents.
    pub used_bytes: u64,
    /// Byte budget.
    pub capacity_bytes: u64,
    /// Highest `used_bytes` observed.
    pub peak_used_bytes: u64,
    /// Number of residents.
    pub resident_count: usize,
    /// Whether the pool takes part in bank switching.
    pub relocatable: bool,
}

impl PoolStats {
    /// Utilisation in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.capacity_bytes as f64
    }
}

/// Counters of the pool allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorCounters {
    /// Successful admissions.
    pub admitted: u64,
    /// Admissions rejected for lack of room.
    pub rejected: u64,
    /// Records removed by garbage collection.
    pub gc_evictions: u64,
    /// Records moved into the overflow pool.
    pub relocations: u64,
    /// Bank-switch victims dropped because overflow was full.
    pub dropped: u64,
    /// Explicit removals.
    pub removed: u64,
    /// Lookups issued.
    pub lookups: u64,
    /// Lookups that found their record.
    pub lookup_hits: u64,
}

impl AllocatorCounters {
    /// Lookup hit rate in `[0, 1]`; zero before the first lookup.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.lookup_hits as f64 / self.lookups as f64
    }
}

/// Snapshot of the whole pool allocator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatorStats {
    /// Per-pool utilisation, in declaration order.
    pub pools: Vec<PoolStats>,
    /// Cumulative counters.
    pub counters: AllocatorCounters,
}

impl AllocatorStats {
    /// Stats of the pool with this name.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolStats> {
        self.pools.iter().find(|p| p.name == name)
    }
}

/// Snapshot of the search-node arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSummary {
    /// Total slots.
    pub capacity: usize,
    /// Live slots.
    pub allocated: usize,
    /// Slots available without eviction.
    pub free: usize,
    /// Entries in the transposition cache.
    pub transposition_count: usize,
    /// Slots reclaimed by FIFO eviction so far.
    pub evictions: u64,
}
