//! # DOCPOOL Core
//!
//! Memory-accounting layer for a document-processing and planning engine:
//! - Priority scorer turning record attributes into a priority byte
//! - Multi-pool record allocator with garbage collection and bank switching
//! - Fixed-capacity search-node arena with UCB selection and transpositions
//!
//! ## Architecture Rules
//!
//! 1. **Accounting only** - payload bytes never pass through these types
//! 2. **Pre-allocated arena** - no per-node heap allocation after construction
//! 3. **Deterministic eviction** - identical inputs give identical victims
//! 4. **No locks** - callers serialize access (see the `docpool` crate)
//!
//! ## Example
//!
//! ```rust
//! use docpool_core::{AllocatorConfig, PoolAllocator, PoolConfig, RecordSpec};
//! use docpool_core::priority::{Category, Urgency};
//!
//! let config = AllocatorConfig::new(
//!     vec![PoolConfig::new("main", 1000, true), PoolConfig::new("spill", 1000, false)],
//!     "spill",
//! );
//! let mut pools = PoolAllocator::new(config)?;
//! pools.admit(RecordSpec::new("a", Category::Evidence, Urgency::High, 0.5, 100))?;
//! assert!(pools.lookup("a").is_some());
//! # Ok::<(), docpool_core::AllocError>(())
//! ```

pub mod arena;
pub mod clock;
pub mod config;
pub mod error;
pub mod pool;
pub mod priority;
pub mod stats;

pub use arena::{NodeHandle, NodeStats, SearchArena, TranspositionEntry};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AllocatorConfig, ArenaConfig, PoolConfig};
pub use error::{AllocError, AllocResult};
pub use pool::{Admission, PoolAllocator, PoolId, Record, RecordSpec};
pub use priority::{score, Attributes, Category, Urgency};
pub use stats::{AllocatorCounters, AllocatorStats, ArenaSummary, PoolStats};
