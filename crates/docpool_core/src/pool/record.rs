//! # Records
//!
//! A record is pure accounting: identity, attributes, payload size and the
//! bookkeeping the eviction policy needs. The payload bytes live elsewhere.

use serde::{Deserialize, Serialize};

use crate::priority::{Attributes, Category, Urgency};

/// Identity of a pool inside one allocator (index in declaration order).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct PoolId(pub(crate) u8);

impl PoolId {
    /// Index of the pool in the allocator's configuration.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A record as submitted by a caller.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSpec {
    /// Opaque, unique identity.
    pub id: String,
    /// Priority-relevant attributes.
    pub attributes: Attributes,
    /// Byte length of the payload stored elsewhere.
    pub payload_size: u64,
}

impl RecordSpec {
    /// Creates a record spec.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: Category,
        urgency: Urgency,
        confidence: f64,
        payload_size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(category, urgency, confidence),
            payload_size,
        }
    }
}

/// A resident record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    /// Opaque, unique identity.
    pub id: String,
    /// Priority-relevant attributes.
    pub attributes: Attributes,
    /// Byte length of the payload.
    pub payload_size: u64,
    /// Score computed at admission or by the last explicit re-score.
    pub priority: u8,
    /// Clock reading of the last admission or successful lookup.
    pub last_accessed: u64,
    /// Pool currently holding the record.
    pub owning_pool: PoolId,
    /// Allocator-wide touch counter; breaks `last_accessed` ties.
    #[serde(skip)]
    pub(crate) access_seq: u64,
}

impl Record {
    /// Urgency tier of the record.
    #[inline]
    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.attributes.urgency
    }

    /// Whether automatic eviction and relocation must skip this record.
    #[inline]
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.urgency().is_critical()
    }

    /// Eviction order key: lowest goes first.
    #[inline]
    pub(crate) fn eviction_key(&self) -> (u8, u64, u64) {
        (self.priority, self.last_accessed, self.access_seq)
    }
}
