//! # Services
//!
//! Thread-safe wrappers over the core components. Each service owns its
//! component behind exactly one `parking_lot::Mutex`; every call takes the
//! lock once and releases it before returning.
//!
//! Records leave the document service as owned clones. Node handles leave
//! the planning service as plain values and stay valid only until the next
//! mutating call that may evict or free their slot.

use docpool_core::arena::{NodeHandle, NodeStats, SearchArena, TranspositionEntry};
use docpool_core::clock::{Clock, MonotonicClock};
use docpool_core::config::{AllocatorConfig, ArenaConfig};
use docpool_core::pool::{Admission, PoolAllocator, PoolId, Record, RecordSpec};
use docpool_core::priority::{Attributes, Category, Urgency};
use docpool_core::stats::{AllocatorStats, ArenaSummary};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::ServiceResult;

/// Shared front of the pool allocator.
#[derive(Debug)]
pub struct DocumentService<C: Clock = MonotonicClock> {
    pools: Mutex<PoolAllocator<C>>,
}

impl DocumentService<MonotonicClock> {
    /// Creates a service driven by the wall clock.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidConfig)` if the configuration fails validation.
    pub fn new(config: AllocatorConfig) -> ServiceResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> DocumentService<C> {
    /// Creates a service with a caller-provided time source.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidConfig)` if the configuration fails validation.
    pub fn with_clock(config: AllocatorConfig, clock: C) -> ServiceResult<Self> {
        let pools = PoolAllocator::with_clock(config, clock)?;
        info!("Document service ready with {} pools", pools.pools().len());
        Ok(Self {
            pools: Mutex::new(pools),
        })
    }

    /// Admits a document's accounting record.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique document id
    /// * `category` - Document category
    /// * `urgency` - Urgency tier
    /// * `confidence` - Classifier confidence, clamped to `[0, 1]`
    /// * `payload_size` - Bytes the payload occupies elsewhere
    ///
    /// # Errors
    ///
    /// Returns `Alloc(DuplicateId)` or `Alloc(InsufficientCapacity)`.
    pub fn submit(
        &self,
        id: &str,
        category: Category,
        urgency: Urgency,
        confidence: f64,
        payload_size: u64,
    ) -> ServiceResult<Admission> {
        let spec = RecordSpec::new(id, category, urgency, confidence, payload_size);
        let result = self.pools.lock().admit(spec);
        if let Err(e) = &result {
            debug!("Submit of {} failed: {}", id, e);
        }
        Ok(result?)
    }

    /// Copy of a record, marking it as accessed.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Record> {
        self.pools.lock().lookup(id).cloned()
    }

    /// Removes a record. Returns whether it was resident.
    pub fn remove(&self, id: &str) -> bool {
        self.pools.lock().remove(id)
    }

    /// Recomputes a record's priority from new attributes.
    pub fn rescore(&self, id: &str, attributes: Attributes) -> Option<u8> {
        self.pools.lock().rescore(id, attributes)
    }

    /// Sweeps every pool. Returns records removed.
    pub fn collect_garbage(&self) -> usize {
        self.pools.lock().collect_garbage()
    }

    /// Utilisation and counters.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        self.pools.lock().stats()
    }

    /// Name of a pool by id.
    #[must_use]
    pub fn pool_name(&self, id: PoolId) -> Option<String> {
        self.pools.lock().pool_name(id).map(str::to_string)
    }

    /// Current reading of the service clock.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.pools.lock().clock().now_ms()
    }
}

/// Shared front of the search-node arena.
#[derive(Debug)]
pub struct PlanningService {
    arena: Mutex<SearchArena>,
    exploration_constant: f64,
}

impl PlanningService {
    /// Creates a service over a fresh arena.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidConfig)` if the configuration fails validation.
    pub fn new(config: ArenaConfig) -> ServiceResult<Self> {
        let arena = SearchArena::new(config)?;
        info!("Planning service ready with {} node slots", config.capacity);
        Ok(Self {
            arena: Mutex::new(arena),
            exploration_constant: config.exploration_constant,
        })
    }

    /// Allocates (or finds) the node for a search state.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidHandle)` for a dead parent or
    /// `Alloc(ArenaExhausted)` when no slot can be reclaimed.
    pub fn allocate_node(
        &self,
        external_id: &str,
        parent: Option<NodeHandle>,
        prior: f64,
        depth: u16,
    ) -> ServiceResult<NodeHandle> {
        Ok(self.arena.lock().allocate(external_id, parent, prior, depth)?)
    }

    /// Records one visit with its backed-up value.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidHandle)` if the node is gone.
    pub fn record_outcome(&self, handle: NodeHandle, value: f64) -> ServiceResult<()> {
        Ok(self.arena.lock().update(handle, value)?)
    }

    /// Records one visit on every node of a path under a single lock.
    ///
    /// Stops at the first dead handle; earlier nodes keep their update.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidHandle)` for the first dead node on the path.
    pub fn backpropagate(&self, path: &[NodeHandle], value: f64) -> ServiceResult<()> {
        let mut arena = self.arena.lock();
        for &handle in path {
            arena.update(handle, value)?;
        }
        Ok(())
    }

    /// Best child by UCB, using the configured constant when
    /// `exploration` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidHandle)` if the parent is gone.
    pub fn choose_child(
        &self,
        handle: NodeHandle,
        exploration: Option<f64>,
    ) -> ServiceResult<Option<NodeHandle>> {
        let c = exploration.unwrap_or(self.exploration_constant);
        Ok(self.arena.lock().select_child_ucb(handle, c)?)
    }

    /// Caches statistics for a state.
    pub fn cache_transposition(&self, external_id: &str, visits: u32, value: f64) {
        self.arena.lock().cache_transposition(external_id, visits, value);
    }

    /// Cached statistics for a state.
    #[must_use]
    pub fn get_transposition(&self, external_id: &str) -> Option<TranspositionEntry> {
        self.arena.lock().get_transposition(external_id)
    }

    /// Releases a node's slot.
    ///
    /// # Errors
    ///
    /// Returns `Alloc(InvalidHandle)` or `Alloc(RootPinned)`.
    pub fn free_node(&self, handle: NodeHandle) -> ServiceResult<()> {
        Ok(self.arena.lock().free(handle)?)
    }

    /// Statistics of a live node.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<NodeStats> {
        self.arena.lock().node(handle)
    }

    /// External identity of a live node.
    #[must_use]
    pub fn external_id(&self, handle: NodeHandle) -> Option<String> {
        self.arena.lock().external_id(handle).map(str::to_string)
    }

    /// Live handle of a state, if allocated.
    #[must_use]
    pub fn handle_of(&self, external_id: &str) -> Option<NodeHandle> {
        self.arena.lock().handle_of(external_id)
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn summarize(&self) -> ArenaSummary {
        self.arena.lock().summarize()
    }

    /// Drops the whole tree and the transposition cache.
    pub fn reset(&self) {
        self.arena.lock().reset();
        info!("Planning arena reset");
    }
}
