//! # Search-Node Arena
//!
//! Pre-allocated storage for tree-search nodes plus a transposition cache.
//!
//! - `handle`: slot handles and the "no node" sentinel
//! - `node_arena`: the arena itself (allocation, UCB selection, eviction)
//! - `transposition`: statistics keyed by external identity

mod handle;
mod node_arena;
mod transposition;

pub use handle::NodeHandle;
pub use node_arena::{Children, NodeStats, SearchArena};
pub use transposition::{TranspositionCache, TranspositionEntry};
