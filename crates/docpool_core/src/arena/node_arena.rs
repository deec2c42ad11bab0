//! # Search-Node Arena
//!
//! Fixed-capacity storage for tree-search nodes, laid out as parallel
//! arrays indexed by handle (struct-of-arrays). Links between nodes are
//! handles, never pointers, so the tree can be rewired and slots reused
//! without ownership cycles.
//!
//! ## Slot Acquisition
//!
//! ```text
//!   allocate(id) ──> id already mapped? ──yes──> existing handle (no change)
//!                        │ no
//!                        v
//!                   freelist ──> unused capacity ──> evict oldest non-root
//! ```
//!
//! Eviction walks the insertion-order queue. The root and the parent of the
//! node being allocated are skipped but keep their place in the queue;
//! entries for slots that were freed or reused since they were queued are
//! discarded.
//!
//! ## Child Lists
//!
//! New children are prepended to the parent's list, so insertion is O(1)
//! and siblings are ordered newest first.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, error};

use super::handle::NodeHandle;
use super::transposition::{TranspositionCache, TranspositionEntry};
use crate::config::ArenaConfig;
use crate::error::{AllocError, AllocResult};
use crate::stats::ArenaSummary;

/// Copy of one node's statistics and links.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStats {
    /// Completed visits.
    pub visits: u32,
    /// Sum of backed-up values.
    pub value_sum: f64,
    /// Prior probability fixed at allocation.
    pub prior: f64,
    /// Parent node, if linked.
    pub parent: Option<NodeHandle>,
    /// Newest child, if any.
    pub first_child: Option<NodeHandle>,
    /// Next older sibling, if any.
    pub next_sibling: Option<NodeHandle>,
    /// Depth below the allocation root.
    pub depth: u16,
}

impl NodeStats {
    /// Mean backed-up value; zero before the first visit.
    #[inline]
    #[must_use]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / f64::from(self.visits)
        }
    }
}

/// Fixed-capacity arena of search-tree nodes.
///
/// # Thread Safety
///
/// NOT thread-safe. Wrap the whole arena in one mutex when sharing it.
///
/// # Example
///
/// ```rust
/// use docpool_core::arena::{NodeHandle, SearchArena};
/// use docpool_core::config::ArenaConfig;
///
/// let mut arena = SearchArena::new(ArenaConfig::new(16))?;
/// let root = arena.allocate("s0", None, 1.0, 0)?;
/// let child = arena.allocate("s1", Some(root), 0.5, 1)?;
/// arena.update(child, 1.0)?;
/// assert_eq!(root, NodeHandle::ROOT);
/// assert_eq!(arena.select_child_ucb(root, 1.4)?, Some(child));
/// # Ok::<(), docpool_core::AllocError>(())
/// ```
#[derive(Debug)]
pub struct SearchArena {
    config: ArenaConfig,

    // Slot columns. `external_ids[i].is_some()` marks slot `i` live.
    external_ids: Box<[Option<String>]>,
    visits: Box<[u32]>,
    value_sum: Box<[f64]>,
    prior: Box<[f64]>,
    parent: Box<[NodeHandle]>,
    first_child: Box<[NodeHandle]>,
    next_sibling: Box<[NodeHandle]>,
    depth: Box<[u16]>,
    /// Tick at which the slot was last allocated; validates queue entries.
    alloc_seq: Box<[u64]>,

    /// Live external id -> handle.
    index: HashMap<String, NodeHandle>,
    /// Released slots, reused LIFO.
    free_list: Vec<NodeHandle>,
    /// Slots `>= high_water` have never been used.
    high_water: usize,
    /// Insertion order of allocations: (handle, `alloc_seq`).
    fifo: VecDeque<(NodeHandle, u64)>,

    transpositions: TranspositionCache,
    allocated: usize,
    tick: u64,
    evictions: u64,
}

impl SearchArena {
    /// Creates an arena with every slot pre-allocated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: ArenaConfig) -> AllocResult<Self> {
        config.validate()?;
        let capacity = config.capacity;

        Ok(Self {
            config,
            external_ids: vec![None; capacity].into_boxed_slice(),
            visits: vec![0; capacity].into_boxed_slice(),
            value_sum: vec![0.0; capacity].into_boxed_slice(),
            prior: vec![0.0; capacity].into_boxed_slice(),
            parent: vec![NodeHandle::NONE; capacity].into_boxed_slice(),
            first_child: vec![NodeHandle::NONE; capacity].into_boxed_slice(),
            next_sibling: vec![NodeHandle::NONE; capacity].into_boxed_slice(),
            depth: vec![0; capacity].into_boxed_slice(),
            alloc_seq: vec![0; capacity].into_boxed_slice(),
            index: HashMap::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            high_water: 0,
            fifo: VecDeque::with_capacity(capacity),
            transpositions: TranspositionCache::new(),
            allocated: 0,
            tick: 0,
            evictions: 0,
        })
    }

    /// Arena of `capacity` slots with default tuning.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero or oversized capacity.
    pub fn with_capacity(capacity: usize) -> AllocResult<Self> {
        Self::new(ArenaConfig::new(capacity))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Arena configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Total slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Live slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.allocated
    }

    /// Whether no slot is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Whether `handle` refers to a live slot.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: NodeHandle) -> bool {
        self.external_ids
            .get(handle.index())
            .is_some_and(Option::is_some)
    }

    /// Handle currently mapped to an external identity.
    #[must_use]
    pub fn handle_of(&self, external_id: &str) -> Option<NodeHandle> {
        self.index.get(external_id).copied()
    }

    /// External identity of a live slot.
    #[must_use]
    pub fn external_id(&self, handle: NodeHandle) -> Option<&str> {
        self.external_ids.get(handle.index())?.as_deref()
    }

    /// Statistics and links of a live slot.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<NodeStats> {
        if !self.is_live(handle) {
            return None;
        }
        let i = handle.index();
        Some(NodeStats {
            visits: self.visits[i],
            value_sum: self.value_sum[i],
            prior: self.prior[i],
            parent: self.parent[i].get(),
            first_child: self.first_child[i].get(),
            next_sibling: self.next_sibling[i].get(),
            depth: self.depth[i],
        })
    }

    /// Mean value of a live slot.
    #[must_use]
    pub fn mean_value(&self, handle: NodeHandle) -> Option<f64> {
        self.node(handle).map(|n| n.mean_value())
    }

    /// Iterates a node's children, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if `handle` is not live.
    pub fn children(&self, handle: NodeHandle) -> AllocResult<Children<'_>> {
        self.check(handle)?;
        Ok(Children {
            arena: self,
            cursor: self.first_child[handle.index()],
        })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Allocates a node, or returns the live handle already mapped to
    /// `external_id` (unchanged, no relinking).
    ///
    /// # Arguments
    ///
    /// * `external_id` - Caller identity used for deduplication
    /// * `parent` - Node to link under, or `None` for an unlinked node
    /// * `prior` - Prior probability, clamped to `[0, 1]`
    /// * `depth` - Depth below the allocation root
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if `parent` is not live
    /// - `ArenaExhausted` if the arena is full and nothing may be evicted
    pub fn allocate(
        &mut self,
        external_id: &str,
        parent: Option<NodeHandle>,
        prior: f64,
        depth: u16,
    ) -> AllocResult<NodeHandle> {
        if let Some(existing) = self.handle_of(external_id) {
            return Ok(existing);
        }
        if let Some(p) = parent {
            self.check(p)?;
        }

        let handle = self.acquire_slot(parent)?;
        let i = handle.index();
        self.tick += 1;

        self.external_ids[i] = Some(external_id.to_string());
        self.visits[i] = 0;
        self.value_sum[i] = 0.0;
        self.prior[i] = if prior.is_nan() { 0.0 } else { prior.clamp(0.0, 1.0) };
        self.depth[i] = depth;
        self.parent[i] = NodeHandle::from_option(parent);
        self.first_child[i] = NodeHandle::NONE;
        self.next_sibling[i] = NodeHandle::NONE;
        self.alloc_seq[i] = self.tick;

        if let Some(p) = parent {
            self.next_sibling[i] = self.first_child[p.index()];
            self.first_child[p.index()] = handle;
        }

        if self.config.seed_from_transpositions {
            if let Some(entry) = self.transpositions.get(external_id) {
                self.visits[i] = entry.visits;
                self.value_sum[i] = entry.value * f64::from(entry.visits);
            }
        }

        self.index.insert(external_id.to_string(), handle);
        self.fifo.push_back((handle, self.tick));
        self.allocated += 1;
        self.compact_queue();

        Ok(handle)
    }

    /// Records one visit with the given backed-up value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if `handle` is not live.
    pub fn update(&mut self, handle: NodeHandle, value: f64) -> AllocResult<()> {
        self.check(handle)?;
        let i = handle.index();
        self.visits[i] = self.visits[i].saturating_add(1);
        self.value_sum[i] += value;
        Ok(())
    }

    /// Picks the child with the highest UCB score.
    ///
    /// `score = q + c * prior * sqrt(max(1, parent_visits)) / (1 + visits)`
    /// where `q` is the child's mean value (0 when unvisited). The first
    /// child in list order wins ties.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if `parent` is not live.
    pub fn select_child_ucb(
        &self,
        parent: NodeHandle,
        exploration_constant: f64,
    ) -> AllocResult<Option<NodeHandle>> {
        self.check(parent)?;
        let sqrt_parent = f64::from(self.visits[parent.index()].max(1)).sqrt();

        let mut best: Option<(NodeHandle, f64)> = None;
        for child in self.children(parent)? {
            let i = child.index();
            let visits = self.visits[i];
            let q = if visits == 0 {
                0.0
            } else {
                self.value_sum[i] / f64::from(visits)
            };
            let u = exploration_constant * self.prior[i] * sqrt_parent / (1.0 + f64::from(visits));
            let score = q + u;
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((child, score));
            }
        }
        Ok(best.map(|(handle, _)| handle))
    }

    /// Releases a slot into the freelist.
    ///
    /// The node is unlinked from its parent; its children stay live as
    /// detached subtrees.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if `handle` is not live
    /// - `RootPinned` for the root slot
    pub fn free(&mut self, handle: NodeHandle) -> AllocResult<()> {
        self.check(handle)?;
        if handle.is_root() {
            return Err(AllocError::RootPinned);
        }
        self.release(handle);
        self.free_list.push(handle);
        Ok(())
    }

    /// Caches statistics for an external identity.
    pub fn cache_transposition(&mut self, external_id: &str, visits: u32, value: f64) {
        self.tick += 1;
        self.transpositions.insert(
            external_id,
            TranspositionEntry {
                visits,
                value,
                updated: self.tick,
            },
        );
    }

    /// Cached statistics for an external identity.
    #[must_use]
    pub fn get_transposition(&self, external_id: &str) -> Option<TranspositionEntry> {
        self.transpositions.get(external_id)
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn summarize(&self) -> ArenaSummary {
        ArenaSummary {
            capacity: self.capacity(),
            allocated: self.allocated,
            free: self.capacity() - self.allocated,
            transposition_count: self.transpositions.len(),
            evictions: self.evictions,
        }
    }

    /// Releases every slot and clears the transposition cache.
    pub fn reset(&mut self) {
        self.external_ids.iter_mut().for_each(|id| *id = None);
        self.parent.fill(NodeHandle::NONE);
        self.first_child.fill(NodeHandle::NONE);
        self.next_sibling.fill(NodeHandle::NONE);
        self.index.clear();
        self.free_list.clear();
        self.fifo.clear();
        self.transpositions.clear();
        self.high_water = 0;
        self.allocated = 0;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check(&self, handle: NodeHandle) -> AllocResult<()> {
        if self.is_live(handle) {
            Ok(())
        } else {
            error!("Arena access through invalid handle {}", handle);
            Err(AllocError::InvalidHandle(handle))
        }
    }

    /// Freelist, then unused capacity, then FIFO eviction.
    fn acquire_slot(&mut self, protect: Option<NodeHandle>) -> AllocResult<NodeHandle> {
        if let Some(handle) = self.free_list.pop() {
            return Ok(handle);
        }
        if self.high_water < self.capacity() {
            let handle = NodeHandle::new(u32::try_from(self.high_water).map_err(|_| {
                AllocError::ArenaExhausted {
                    capacity: self.capacity(),
                }
            })?);
            self.high_water += 1;
            return Ok(handle);
        }
        self.evict_oldest(protect)
    }

    /// Evicts the oldest live slot other than the root and `protect`.
    ///
    /// Skipped entries keep their queue position.
    fn evict_oldest(&mut self, protect: Option<NodeHandle>) -> AllocResult<NodeHandle> {
        let mut skipped = Vec::new();
        let mut victim = None;
        while let Some((handle, seq)) = self.fifo.pop_front() {
            if !self.is_live(handle) || self.alloc_seq[handle.index()] != seq {
                continue;
            }
            if handle.is_root() || Some(handle) == protect {
                skipped.push((handle, seq));
                continue;
            }
            victim = Some(handle);
            break;
        }
        for entry in skipped.into_iter().rev() {
            self.fifo.push_front(entry);
        }

        let Some(handle) = victim else {
            return Err(AllocError::ArenaExhausted {
                capacity: self.capacity(),
            });
        };
        debug!(
            "Evicting node {} ({})",
            handle,
            self.external_ids[handle.index()].as_deref().unwrap_or_default()
        );
        self.release(handle);
        self.evictions += 1;
        Ok(handle)
    }

    /// Unlinks a live slot, detaches its children and drops its mapping.
    fn release(&mut self, handle: NodeHandle) {
        let i = handle.index();

        let parent = self.parent[i];
        if self.is_live(parent) {
            let p = parent.index();
            if self.first_child[p] == handle {
                self.first_child[p] = self.next_sibling[i];
            } else {
                let mut cursor = self.first_child[p];
                while !cursor.is_none() {
                    let next = self.next_sibling[cursor.index()];
                    if next == handle {
                        self.next_sibling[cursor.index()] = self.next_sibling[i];
                        break;
                    }
                    cursor = next;
                }
            }
        }

        let mut child = self.first_child[i];
        while !child.is_none() {
            let next = self.next_sibling[child.index()];
            self.parent[child.index()] = NodeHandle::NONE;
            self.next_sibling[child.index()] = NodeHandle::NONE;
            child = next;
        }

        if let Some(id) = self.external_ids[i].take() {
            self.index.remove(&id);
        }
        self.parent[i] = NodeHandle::NONE;
        self.first_child[i] = NodeHandle::NONE;
        self.next_sibling[i] = NodeHandle::NONE;
        self.allocated -= 1;
    }

    /// Drops queue entries for freed or reused slots once they dominate.
    fn compact_queue(&mut self) {
        if self.fifo.len() <= self.capacity() * 2 {
            return;
        }
        let (external_ids, alloc_seq) = (&self.external_ids, &self.alloc_seq);
        self.fifo
            .retain(|(h, seq)| external_ids[h.index()].is_some() && alloc_seq[h.index()] == *seq);
    }
}

/// Iterator over a node's children, newest first.
#[derive(Debug)]
pub struct Children<'a> {
    arena: &'a SearchArena,
    cursor: NodeHandle,
}

impl Iterator for Children<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.cursor.get()?;
        self.cursor = self.arena.next_sibling[current.index()];
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(capacity: usize) -> SearchArena {
        SearchArena::with_capacity(capacity).unwrap()
    }

    /// Every child list only holds nodes whose parent is the list owner.
    fn assert_links_consistent(arena: &SearchArena) {
        for i in 0..arena.capacity() {
            let handle = NodeHandle::new(u32::try_from(i).unwrap());
            if !arena.is_live(handle) {
                continue;
            }
            for child in arena.children(handle).unwrap() {
                assert!(arena.is_live(child));
                assert_eq!(arena.node(child).unwrap().parent, Some(handle));
            }
        }
    }

    #[test]
    fn test_allocate_is_idempotent() {
        let mut a = arena(4);
        let root = a.allocate("s0", None, 1.0, 0).unwrap();
        let first = a.allocate("s1", Some(root), 0.3, 1).unwrap();
        let second = a.allocate("s1", Some(root), 0.9, 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(a.len(), 2);
        assert!((a.node(first).unwrap().prior - 0.3).abs() < f64::EPSILON);
        assert_eq!(a.children(root).unwrap().count(), 1);
    }

    #[test]
    fn test_children_prepended() {
        let mut a = arena(8);
        let root = a.allocate("root", None, 1.0, 0).unwrap();
        let c1 = a.allocate("c1", Some(root), 0.1, 1).unwrap();
        let c2 = a.allocate("c2", Some(root), 0.1, 1).unwrap();
        let c3 = a.allocate("c3", Some(root), 0.1, 1).unwrap();
        let order: Vec<NodeHandle> = a.children(root).unwrap().collect();
        assert_eq!(order, vec![c3, c2, c1]);
        assert_links_consistent(&a);
    }

    #[test]
    fn test_full_arena_evicts_oldest_non_root() {
        let mut a = arena(2);
        let root = a.allocate("s0", None, 1.0, 0).unwrap();
        assert_eq!(root, NodeHandle::ROOT);
        let s1 = a.allocate("s1", Some(root), 0.5, 1).unwrap();
        assert_eq!(s1, NodeHandle::new(1));
        assert_eq!(a.summarize().free, 0);

        let s2 = a.allocate("s2", Some(root), 0.5, 1).unwrap();
        assert_eq!(s2, NodeHandle::new(1));
        assert_eq!(a.external_id(s2), Some("s2"));
        assert!(a.handle_of("s1").is_none());
        assert!(a.get_transposition("s1").is_none());
        assert!(a.is_live(NodeHandle::ROOT));
        assert_eq!(a.summarize().evictions, 1);
        assert_links_consistent(&a);
    }

    #[test]
    fn test_eviction_follows_insertion_order() {
        let mut a = arena(4);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let x = a.allocate("x", Some(root), 0.5, 1).unwrap();
        let y = a.allocate("y", Some(root), 0.5, 1).unwrap();
        a.allocate("z", Some(root), 0.5, 1).unwrap();

        assert_eq!(a.allocate("w1", Some(root), 0.5, 1).unwrap(), x);
        assert_eq!(a.allocate("w2", Some(root), 0.5, 1).unwrap(), y);
        assert!(a.handle_of("x").is_none());
        assert!(a.handle_of("y").is_none());
        assert_links_consistent(&a);
    }

    #[test]
    fn test_protected_parent_keeps_its_age() {
        let mut a = arena(4);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let first = a.allocate("a", Some(root), 0.5, 1).unwrap();
        let second = a.allocate("b", Some(root), 0.5, 1).unwrap();
        a.allocate("c", Some(root), 0.5, 1).unwrap();

        // "a" is protected as the parent, so "b" goes.
        assert_eq!(a.allocate("d", Some(first), 0.5, 2).unwrap(), second);
        assert!(a.handle_of("b").is_none());

        // "a" is still the oldest non-root node.
        assert_eq!(a.allocate("e", Some(root), 0.5, 1).unwrap(), first);
        assert!(a.handle_of("a").is_none());
        assert!(a.handle_of("c").is_some());
        assert!(a.handle_of("d").is_some());
        assert_links_consistent(&a);
    }

    #[test]
    fn test_parent_is_not_evicted_for_its_own_child() {
        let mut a = arena(2);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let only = a.allocate("a", Some(root), 0.5, 1).unwrap();
        let err = a.allocate("b", Some(only), 0.5, 2).unwrap_err();
        assert_eq!(err, AllocError::ArenaExhausted { capacity: 2 });
        assert!(a.is_live(only));
    }

    #[test]
    fn test_single_slot_arena_exhausts() {
        let mut a = arena(1);
        a.allocate("r", None, 1.0, 0).unwrap();
        assert!(matches!(
            a.allocate("x", None, 1.0, 0),
            Err(AllocError::ArenaExhausted { .. })
        ));
    }

    #[test]
    fn test_free_reuses_slot_and_detaches_children() {
        let mut a = arena(8);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let mid = a.allocate("m", Some(root), 0.5, 1).unwrap();
        let leaf = a.allocate("l", Some(mid), 0.5, 2).unwrap();

        a.free(mid).unwrap();
        assert!(!a.is_live(mid));
        assert_eq!(a.children(root).unwrap().count(), 0);
        assert_eq!(a.node(leaf).unwrap().parent, None);

        let again = a.allocate("n", Some(root), 0.5, 1).unwrap();
        assert_eq!(again, mid);
        assert_links_consistent(&a);
    }

    #[test]
    fn test_free_errors() {
        let mut a = arena(4);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        assert_eq!(a.free(root), Err(AllocError::RootPinned));
        let ghost = NodeHandle::new(3);
        assert_eq!(a.free(ghost), Err(AllocError::InvalidHandle(ghost)));
        assert_eq!(a.update(ghost, 1.0), Err(AllocError::InvalidHandle(ghost)));
        assert!(a.select_child_ucb(ghost, 1.0).is_err());
        assert!(a.allocate("x", Some(ghost), 0.5, 1).is_err());
        assert!(a.update(NodeHandle::NONE, 1.0).is_err());
    }

    #[test]
    fn test_update_accumulates() {
        let mut a = arena(2);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        a.update(root, 1.0).unwrap();
        a.update(root, 0.0).unwrap();
        let stats = a.node(root).unwrap();
        assert_eq!(stats.visits, 2);
        assert!((stats.mean_value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ucb_unvisited_single_child() {
        let mut a = arena(4);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        assert_eq!(a.select_child_ucb(root, 1.4).unwrap(), None);
        let child = a.allocate("c", Some(root), 0.5, 1).unwrap();
        assert_eq!(a.select_child_ucb(root, 1.4).unwrap(), Some(child));
    }

    #[test]
    fn test_ucb_balances_value_and_exploration() {
        let mut a = arena(8);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let good = a.allocate("good", Some(root), 0.1, 1).unwrap();
        let fresh = a.allocate("fresh", Some(root), 0.9, 1).unwrap();
        for _ in 0..9 {
            a.update(root, 0.0).unwrap();
        }
        for _ in 0..4 {
            a.update(good, 1.0).unwrap();
        }

        // good: 1.0 + c*0.1*3/5, fresh: 0 + c*0.9*3/1
        assert_eq!(a.select_child_ucb(root, 1.0).unwrap(), Some(fresh));
        // No exploration: pure exploitation.
        assert_eq!(a.select_child_ucb(root, 0.0).unwrap(), Some(good));
    }

    #[test]
    fn test_ucb_tie_goes_to_first_in_list() {
        let mut a = arena(8);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        a.allocate("older", Some(root), 0.5, 1).unwrap();
        let newer = a.allocate("newer", Some(root), 0.5, 1).unwrap();
        assert_eq!(a.select_child_ucb(root, 1.0).unwrap(), Some(newer));
    }

    #[test]
    fn test_transposition_cache_is_independent_of_slots() {
        let mut a = arena(2);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        a.allocate("s1", Some(root), 0.5, 1).unwrap();
        a.cache_transposition("s1", 12, 0.25);
        a.allocate("s2", Some(root), 0.5, 1).unwrap();

        let entry = a.get_transposition("s1").unwrap();
        assert_eq!(entry.visits, 12);
        assert_eq!(a.summarize().transposition_count, 1);
    }

    #[test]
    fn test_seeding_from_transpositions() {
        let mut config = ArenaConfig::new(4);
        config.seed_from_transpositions = true;
        let mut a = SearchArena::new(config).unwrap();
        a.cache_transposition("seen", 4, 0.5);

        let root = a.allocate("r", None, 1.0, 0).unwrap();
        let seen = a.allocate("seen", Some(root), 0.5, 1).unwrap();
        let stats = a.node(seen).unwrap();
        assert_eq!(stats.visits, 4);
        assert!((stats.value_sum - 2.0).abs() < f64::EPSILON);

        let cold = a.allocate("cold", Some(root), 0.5, 1).unwrap();
        assert_eq!(a.node(cold).unwrap().visits, 0);
    }

    #[test]
    fn test_fresh_slots_start_cold_by_default() {
        let mut a = arena(4);
        a.cache_transposition("seen", 4, 0.5);
        let h = a.allocate("seen", None, 0.5, 0).unwrap();
        assert_eq!(a.node(h).unwrap().visits, 0);
    }

    #[test]
    fn test_churn_keeps_queue_bounded() {
        let mut a = arena(8);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        for i in 0..10_000 {
            let h = a.allocate(&format!("n{i}"), Some(root), 0.5, 1).unwrap();
            a.update(h, 0.5).unwrap();
            if i % 3 == 0 {
                a.free(h).unwrap();
            }
        }
        assert!(a.fifo.len() <= a.capacity() * 2 + 1);
        assert!(a.len() <= a.capacity());
        assert_eq!(a.index.len(), a.len());
        assert_links_consistent(&a);
    }

    #[test]
    fn test_reset() {
        let mut a = arena(4);
        let root = a.allocate("r", None, 1.0, 0).unwrap();
        a.allocate("c", Some(root), 0.5, 1).unwrap();
        a.cache_transposition("c", 1, 1.0);
        a.reset();
        assert!(a.is_empty());
        assert_eq!(a.summarize().transposition_count, 0);
        assert_eq!(a.allocate("again", None, 1.0, 0).unwrap(), NodeHandle::ROOT);
    }
}
