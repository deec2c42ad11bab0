//! # Node Handles
//!
//! A handle is a plain slot index. It stays meaningful only until the next
//! mutation that may evict or free its slot; the arena checks liveness on
//! every use and reports `InvalidHandle` instead of following a stale link.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a slot in the search-node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeHandle(u32);

impl NodeHandle {
    /// The root slot. Never evicted while the arena is in use.
    pub const ROOT: Self = Self(0);

    /// Sentinel for "no node" inside link arrays.
    pub const NONE: Self = Self(u32::MAX);

    /// Creates a handle from a raw slot index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Whether this is the root slot.
    #[inline]
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Option<Self> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }

    /// Inverse of [`NodeHandle::get`].
    #[inline]
    #[must_use]
    pub const fn from_option(handle: Option<Self>) -> Self {
        match handle {
            Some(h) => h,
            None => Self::NONE,
        }
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("-1")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
