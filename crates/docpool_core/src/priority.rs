//! # Priority Scorer
//!
//! **Pure mapping from record attributes to a priority byte.**
//!
//! The score drives both admission (which pool) and eviction (who goes
//! first), so it must be deterministic for identical inputs: the same
//! record always lands in the same place and is evicted in the same order.
//!
//! ```text
//! score = clamp(urgency_base + floor(confidence * 31) + category_adjustment, 0, 255)
//! ```
//!
//! | Urgency  | Base |      | Category  | Adjustment |
//! |----------|------|------|-----------|------------|
//! | low      | 64   |      | evidence  | +16        |
//! | medium   | 128  |      | precedent | +8         |
//! | high     | 192  |      | contract  | +4         |
//! | critical | 255  |      | brief     | 0          |
//! |          |      |      | citation  | 0          |
//! |          |      |      | generated | -32        |

use serde::{Deserialize, Serialize};

/// Maximum boost contributed by a confidence of 1.0.
pub const CONFIDENCE_SPAN: f64 = 31.0;

/// Domain tag of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Category {
    /// Contracts and agreements.
    Contract = 0,
    /// Evidentiary material (highest evidentiary weight).
    Evidence = 1,
    /// Briefs and memoranda.
    Brief = 2,
    /// Citations to other material.
    Citation = 3,
    /// Case law and precedent.
    Precedent = 4,
    /// Machine-generated content (summaries, drafts).
    Generated = 5,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Contract,
        Self::Evidence,
        Self::Brief,
        Self::Citation,
        Self::Precedent,
        Self::Generated,
    ];

    /// Fixed score adjustment for this category.
    #[inline]
    #[must_use]
    pub const fn adjustment(self) -> i32 {
        match self {
            Self::Evidence => 16,
            Self::Precedent => 8,
            Self::Contract => 4,
            Self::Brief | Self::Citation => 0,
            Self::Generated => -32,
        }
    }
}

/// Ordered urgency tier of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Urgency {
    /// Background material.
    Low = 0,
    /// Normal working set.
    Medium = 1,
    /// Actively needed.
    High = 2,
    /// Never evicted or relocated automatically.
    Critical = 3,
}

impl Urgency {
    /// All tiers, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Base score for this tier.
    #[inline]
    #[must_use]
    pub const fn base_score(self) -> i32 {
        match self {
            Self::Low => 64,
            Self::Medium => 128,
            Self::High => 192,
            Self::Critical => 255,
        }
    }

    /// Whether records of this tier are exempt from automatic eviction.
    #[inline]
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// The attribute set that determines a record's priority.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Domain tag.
    pub category: Category,
    /// Urgency tier.
    pub urgency: Urgency,
    /// Confidence in `[0, 1]`; values outside are clamped when scoring.
    pub confidence: f64,
}

impl Attributes {
    /// Creates an attribute set.
    #[inline]
    #[must_use]
    pub const fn new(category: Category, urgency: Urgency, confidence: f64) -> Self {
        Self {
            category,
            urgency,
            confidence,
        }
    }

    /// Scores this attribute set.
    #[inline]
    #[must_use]
    pub fn priority(&self) -> u8 {
        score(self.category, self.urgency, self.confidence)
    }
}

/// Computes the priority of a record.
///
/// # Arguments
///
/// * `category` - Domain tag
/// * `urgency` - Urgency tier
/// * `confidence` - Confidence in `[0, 1]` (clamped; NaN counts as 0)
#[must_use]
pub fn score(category: Category, urgency: Urgency, confidence: f64) -> u8 {
    let confidence = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    // Bounded to [0, 31] by the clamp above.
    #[allow(clippy::cast_possible_truncation)]
    let boost = (confidence * CONFIDENCE_SPAN).floor() as i32;

    let raw = urgency.base_score() + boost + category.adjustment();
    u8::try_from(raw.clamp(0, 255)).unwrap_or(u8::MAX)
}
