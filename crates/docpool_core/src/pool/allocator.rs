//! # Pool Allocator
//!
//! Admits variable-sized records into a fixed set of pools under a byte
//! budget.
//!
//! ## Admission Pipeline
//!
//! ```text
//!   RecordSpec ──> score ──> route ──> fits? ──yes──────────────────────> store
//!                                        │                                 ^
//!                                        no                                │
//!                                        v                                 │
//!                              garbage-collect target ──> fits? ──yes──────┤
//!                                                           │              │
//!                                                           no             │
//!                                                           v              │
//!                                    plan bank switch (relocatable only)   │
//!                                       │ enough?  ──yes──> relocate ──────┘
//!                                       no
//!                                       v
//!                              InsufficientCapacity
//! ```
//!
//! ## Eviction Order
//!
//! Lowest `(priority, last_accessed)` first; a per-allocator touch sequence
//! breaks exact timestamp ties. Critical records are never candidates, and
//! neither is any record that outranks the incoming one.
//!
//! ## Reference Validity
//!
//! `lookup` returns a borrow of the allocator. The borrow checker ends it
//! before the next mutating call, which is exactly when relocation or
//! eviction could move or drop the record.

use tracing::{debug, info, warn};

use super::bank::Pool;
use super::record::{PoolId, Record, RecordSpec};
use crate::clock::{Clock, MonotonicClock};
use crate::config::AllocatorConfig;
use crate::error::{AllocError, AllocResult};
use crate::priority::Attributes;
use crate::stats::{AllocatorCounters, AllocatorStats, PoolStats};

/// Outcome of a successful admission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Admission {
    /// Pool now holding the record.
    pub pool: PoolId,
    /// Priority assigned to the record.
    pub priority: u8,
    /// Records removed by garbage collection to make room.
    pub collected: usize,
    /// Records moved into the overflow pool to make room.
    pub relocated: Vec<String>,
    /// Records dropped because the overflow pool was full.
    pub dropped: Vec<String>,
}

/// Priority-aware, multi-pool record allocator.
///
/// # Thread Safety
///
/// NOT thread-safe. Wrap the whole allocator in one mutex when sharing it.
///
/// # Example
///
/// ```rust
/// use docpool_core::config::{AllocatorConfig, PoolConfig};
/// use docpool_core::pool::{PoolAllocator, RecordSpec};
/// use docpool_core::priority::{Category, Urgency};
///
/// let config = AllocatorConfig::new(
///     vec![
///         PoolConfig::new("working", 1024, true),
///         PoolConfig::new("overflow", 4096, false),
///     ],
///     "overflow",
/// );
/// let mut pools = PoolAllocator::new(config)?;
/// let admission = pools.admit(RecordSpec::new("doc-1", Category::Brief, Urgency::Medium, 0.9, 512))?;
/// assert_eq!(pools.pool_name(admission.pool), Some("working"));
/// # Ok::<(), docpool_core::AllocError>(())
/// ```
#[derive(Debug)]
pub struct PoolAllocator<C: Clock = MonotonicClock> {
    /// All pools, in declaration order (index == `PoolId`).
    pools: Vec<Pool>,
    /// Destination of bank-switched records.
    overflow: PoolId,
    /// GC staleness window.
    staleness_ms: u64,
    /// GC priority floor.
    priority_floor: u8,
    /// Time source for `last_accessed`.
    clock: C,
    /// Touch sequence (tie-breaker for equal timestamps).
    access_seq: u64,
    /// Cumulative counters.
    counters: AllocatorCounters,
}

impl PoolAllocator<MonotonicClock> {
    /// Creates an allocator driven by the wall clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: AllocatorConfig) -> AllocResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> PoolAllocator<C> {
    /// Creates an allocator with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_clock(config: AllocatorConfig, clock: C) -> AllocResult<Self> {
        config.validate()?;

        let AllocatorConfig {
            pools,
            overflow_pool,
            staleness_ms,
            priority_floor,
        } = config;

        let pools: Vec<Pool> = pools
            .into_iter()
            .zip(0u8..)
            .map(|(pool, index)| Pool::new(PoolId(index), pool))
            .collect();
        let overflow = pools
            .iter()
            .find(|p| p.name() == overflow_pool)
            .map(Pool::id)
            .ok_or_else(|| AllocError::InvalidConfig(format!("unknown pool {overflow_pool}")))?;

        debug!(
            "Pool allocator ready: {} pools, overflow={}, staleness={}ms, floor={}",
            pools.len(),
            overflow_pool,
            staleness_ms,
            priority_floor
        );

        Ok(Self {
            pools,
            overflow,
            staleness_ms,
            priority_floor,
            clock,
            access_seq: 0,
            counters: AllocatorCounters::default(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// All pools, in declaration order.
    #[inline]
    #[must_use]
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Pool by id.
    #[inline]
    #[must_use]
    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.get(id.index())
    }

    /// Id of the pool with this name.
    #[must_use]
    pub fn pool_id(&self, name: &str) -> Option<PoolId> {
        self.pools.iter().find(|p| p.name() == name).map(Pool::id)
    }

    /// Name of the pool with this id.
    #[must_use]
    pub fn pool_name(&self, id: PoolId) -> Option<&str> {
        self.pool(id).map(Pool::name)
    }

    /// The designated overflow pool.
    #[inline]
    #[must_use]
    pub const fn overflow_pool(&self) -> PoolId {
        self.overflow
    }

    /// The time source.
    #[inline]
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Total resident records across all pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.iter().map(Pool::len).sum()
    }

    /// Whether no pool holds anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.iter().all(Pool::is_empty)
    }

    /// Whether a record with this id is resident.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pools.iter().any(|p| p.contains(id))
    }

    /// Reads a record without touching its `last_accessed`.
    #[must_use]
    pub fn peek(&self, id: &str) -> Option<&Record> {
        self.pools.iter().find_map(|p| p.get(id))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Admits a record.
    ///
    /// Scores the record, routes it, and makes room by garbage collection
    /// and then bank switching when the target pool is full.
    ///
    /// # Errors
    ///
    /// - `DuplicateId` if a record with this id is already resident
    /// - `InsufficientCapacity` if no room can be made; nothing is relocated
    ///   in that case (garbage collection may still have run)
    pub fn admit(&mut self, spec: RecordSpec) -> AllocResult<Admission> {
        if self.contains(&spec.id) {
            return Err(AllocError::DuplicateId(spec.id));
        }

        let priority = spec.attributes.priority();
        let size = spec.payload_size;
        let target = self.route(&spec.attributes, size);
        let now = self.clock.now_ms();

        let mut admission = Admission {
            pool: target,
            priority,
            ..Admission::default()
        };

        if !self.pools[target.index()].fits(size) {
            let capacity = self.pools[target.index()].capacity_bytes();
            if size > capacity {
                return Err(self.reject(target, size, capacity));
            }

            admission.collected = self.collect_pool(target, now);

            if !self.pools[target.index()].fits(size) {
                let plan = if self.pools[target.index()].is_relocatable() {
                    self.plan_bank_switch(target, size, priority)
                } else {
                    Err(self.pools[target.index()].free_bytes())
                };
                match plan {
                    Ok(victims) => self.bank_switch(target, victims, &mut admission),
                    Err(available) => return Err(self.reject(target, size, available)),
                }
            }
        }

        let access_seq = self.next_seq();
        let record = Record {
            id: spec.id,
            attributes: spec.attributes,
            payload_size: size,
            priority,
            last_accessed: now,
            owning_pool: target,
            access_seq,
        };
        debug!(
            "Admitted {} ({} bytes, priority {}) into {}",
            record.id,
            size,
            priority,
            self.pools[target.index()].name()
        );
        self.pools[target.index()].insert(record);
        self.counters.admitted += 1;

        Ok(admission)
    }

    /// Finds a record and marks it as accessed.
    ///
    /// Scans every pool. The returned reference is valid until the next
    /// mutating call on the allocator.
    pub fn lookup(&mut self, id: &str) -> Option<&Record> {
        self.counters.lookups += 1;
        let now = self.clock.now_ms();
        let access_seq = self.next_seq();

        let Some(record) = self.pools.iter_mut().find_map(|p| p.get_mut(id)) else {
            debug!("Lookup miss for {}", id);
            return None;
        };
        record.last_accessed = now;
        record.access_seq = access_seq;
        self.counters.lookup_hits += 1;
        Some(record)
    }

    /// Removes a record from its pool. Returns whether it was resident.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.pools.iter_mut().find_map(|p| p.take(id));
        if removed.is_some() {
            self.counters.removed += 1;
        }
        removed.is_some()
    }

    /// Replaces a record's attributes and recomputes its priority.
    ///
    /// The record stays in its pool. Returns the new priority, or `None`
    /// if the id is unknown.
    pub fn rescore(&mut self, id: &str, attributes: Attributes) -> Option<u8> {
        let record = self.pools.iter_mut().find_map(|p| p.get_mut(id))?;
        record.attributes = attributes;
        record.priority = attributes.priority();
        debug!("Rescored {} to priority {}", id, record.priority);
        Some(record.priority)
    }

    /// Runs garbage collection over every pool. Returns records removed.
    pub fn collect_garbage(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ids: Vec<PoolId> = self.pools.iter().map(Pool::id).collect();
        ids.into_iter().map(|id| self.collect_pool(id, now)).sum()
    }

    /// Snapshot of utilisation and counters.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            pools: self
                .pools
                .iter()
                .map(|p| PoolStats {
                    name: p.name().to_string(),
                    used_bytes: p.used_bytes(),
                    capacity_bytes: p.capacity_bytes(),
                    peak_used_bytes: p.peak_used_bytes(),
                    resident_count: p.len(),
                    relocatable: p.is_relocatable(),
                })
                .collect(),
            counters: self.counters,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    /// Picks the target pool for a record.
    fn route(&self, attrs: &Attributes, size: u64) -> PoolId {
        let mut first_preferred = None;
        for pool in self.pools.iter().filter(|p| p.id() != self.overflow) {
            if pool.config().prefers(attrs) {
                if pool.fits(size) {
                    return pool.id();
                }
                first_preferred.get_or_insert(pool.id());
            }
        }
        if let Some(id) = first_preferred {
            return id;
        }

        self.pools
            .iter()
            .filter(|p| p.id() != self.overflow && p.is_relocatable())
            // Most free bytes; earliest declared wins ties.
            .max_by(|a, b| {
                a.free_bytes()
                    .cmp(&b.free_bytes())
                    .then_with(|| b.id().cmp(&a.id()))
            })
            .or_else(|| self.pools.iter().find(|p| p.id() != self.overflow))
            .map_or(self.overflow, Pool::id)
    }

    /// Removes stale, low-priority, non-critical residents of one pool.
    fn collect_pool(&mut self, id: PoolId, now: u64) -> usize {
        let pool = &mut self.pools[id.index()];
        let garbage = pool.garbage(now, self.staleness_ms, self.priority_floor);
        for record_id in &garbage {
            pool.take(record_id);
        }
        if !garbage.is_empty() {
            debug!("Collected {} stale records from {}", garbage.len(), pool.name());
        }
        self.counters.gc_evictions += garbage.len() as u64;
        garbage.len()
    }

    /// Chooses victims that free enough room for `size` bytes.
    ///
    /// Returns the reclaimable byte count when no sufficient victim set exists.
    fn plan_bank_switch(&self, target: PoolId, size: u64, ceiling: u8) -> Result<Vec<String>, u64> {
        let pool = &self.pools[target.index()];
        let free = pool.free_bytes();
        let shortfall = size.saturating_sub(free);

        let mut freed = 0u64;
        let mut victims = Vec::new();
        // At most one pass per resident.
        for record in pool.eviction_order(ceiling).into_iter().take(pool.len()) {
            if freed >= shortfall {
                break;
            }
            freed += record.payload_size;
            victims.push(record.id.clone());
        }

        if freed >= shortfall {
            Ok(victims)
        } else {
            Err(free + freed)
        }
    }

    /// Moves planned victims to the overflow pool, dropping what does not fit.
    fn bank_switch(&mut self, target: PoolId, victims: Vec<String>, admission: &mut Admission) {
        let overflow = self.overflow;
        for id in victims {
            let Some(record) = self.pools[target.index()].take(&id) else {
                continue;
            };
            if target != overflow && self.pools[overflow.index()].fits(record.payload_size) {
                info!(
                    "Relocated {} ({} bytes) from {} to {}",
                    id,
                    record.payload_size,
                    self.pools[target.index()].name(),
                    self.pools[overflow.index()].name()
                );
                self.pools[overflow.index()].insert(record);
                self.counters.relocations += 1;
                admission.relocated.push(id);
            } else {
                info!(
                    "Dropped {} ({} bytes) from {}: overflow full",
                    id,
                    record.payload_size,
                    self.pools[target.index()].name()
                );
                self.counters.dropped += 1;
                admission.dropped.push(id);
            }
        }
    }

    fn reject(&mut self, target: PoolId, needed: u64, available: u64) -> AllocError {
        self.counters.rejected += 1;
        let pool = self.pools[target.index()].name().to_string();
        warn!(
            "Rejected admission into {}: need {} bytes, {} reclaimable",
            pool, needed, available
        );
        AllocError::InsufficientCapacity {
            pool,
            needed,
            available,
        }
    }
}
