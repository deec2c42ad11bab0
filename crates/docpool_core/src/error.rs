//! # Allocator Error Types
//!
//! All failures the pool allocator and the search-node arena can report.
//!
//! Absence is not an error: `lookup`/`remove` on an unknown id answer with
//! `None`/`false`, never with a variant from this enum.

use thiserror::Error;

use crate::arena::NodeHandle;

/// Errors that can occur in the allocators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// No room for the record, even after garbage collection and bank switching.
    #[error("insufficient capacity in pool {pool}: need {needed} bytes, {available} reclaimable")]
    InsufficientCapacity {
        /// Name of the pool the record was routed to.
        pool: String,
        /// Bytes the record needs.
        needed: u64,
        /// Bytes that were free or could have been reclaimed.
        available: u64,
    },

    /// A record with this id is already resident.
    #[error("duplicate record id: {0}")]
    DuplicateId(String),

    /// Arena operation referenced a freed or never-allocated handle.
    #[error("invalid node handle: {0}")]
    InvalidHandle(NodeHandle),

    /// The arena is full and holds no slot that may be evicted.
    #[error("arena exhausted: all {capacity} slots pinned")]
    ArenaExhausted {
        /// Arena capacity in slots.
        capacity: usize,
    },

    /// The root slot cannot be released while the arena is in use.
    #[error("root node is pinned and cannot be freed")]
    RootPinned,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;
