//! # DOCPOOL
//!
//! Thread-safe services over the `docpool_core` allocators:
//! - [`DocumentService`]: priority-aware admission of document records
//! - [`PlanningService`]: search-tree nodes with UCB selection
//! - [`Monitor`]: pull or push snapshots for observability
//!
//! ## Architecture Rules
//!
//! 1. **One lock per component** - every call holds it briefly, never two at once
//! 2. **Owned results** - records leave the service as clones
//! 3. **Config at startup** - one TOML file, validated before anything runs
//!
//! ## Example
//!
//! ```rust
//! use docpool::{DocumentService, ServiceConfig};
//! use docpool::core::priority::{Category, Urgency};
//!
//! let config = ServiceConfig::from_toml_str(r#"
//!     [allocator]
//!     overflow_pool = "overflow"
//!     [[allocator.pools]]
//!     name = "working"
//!     capacity_bytes = 1024
//!     relocatable = true
//!     [[allocator.pools]]
//!     name = "overflow"
//!     capacity_bytes = 1024
//!     [arena]
//!     capacity = 64
//! "#)?;
//! let documents = DocumentService::new(config.allocator)?;
//! documents.submit("doc-1", Category::Evidence, Urgency::High, 0.8, 256)?;
//! assert!(documents.lookup("doc-1").is_some());
//! # Ok::<(), docpool::ServiceError>(())
//! ```

pub mod config;
pub mod error;
pub mod monitor;
pub mod service;

/// Re-export of the core allocators.
pub use docpool_core as core;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use monitor::{Monitor, Snapshot};
pub use service::{DocumentService, PlanningService};
