//! # Record Pools
//!
//! Byte-budgeted pools of attribute-tagged records.
//!
//! - `record`: the record model and pool identities
//! - `bank`: a single fixed-capacity pool
//! - `allocator`: admission, garbage collection and bank switching

mod allocator;
mod bank;
mod record;

pub use allocator::{Admission, PoolAllocator};
pub use bank::Pool;
pub use record::{PoolId, Record, RecordSpec};
