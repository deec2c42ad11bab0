//! # Allocator Configuration
//!
//! Pool layout, GC thresholds and arena sizing. Loaded once at startup,
//! usually from a TOML file:
//!
//! ```toml
//! staleness_ms = 300000
//! priority_floor = 128
//! overflow_pool = "overflow"
//!
//! [[pools]]
//! name = "vault"
//! capacity_bytes = 1048576
//! relocatable = false
//! urgencies = ["critical"]
//!
//! [[pools]]
//! name = "working"
//! capacity_bytes = 4194304
//! relocatable = true
//!
//! [[pools]]
//! name = "overflow"
//! capacity_bytes = 8388608
//! relocatable = false
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AllocError, AllocResult};
use crate::priority::{Attributes, Category, Urgency};

/// Default staleness window: five minutes.
pub const DEFAULT_STALENESS_MS: u64 = 5 * 60 * 1000;

/// Default GC priority floor: records below medium base are collectable.
pub const DEFAULT_PRIORITY_FLOOR: u8 = 128;

/// Default UCB exploration constant (sqrt 2).
pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// One pool of the allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Unique pool name.
    pub name: String,
    /// Byte budget.
    pub capacity_bytes: u64,
    /// Whether residents may be moved out under pressure.
    #[serde(default)]
    pub relocatable: bool,
    /// Categories this pool prefers. Empty = no category preference.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Urgency tiers this pool prefers. Empty = no urgency preference.
    #[serde(default)]
    pub urgencies: Vec<Urgency>,
}

impl PoolConfig {
    /// A pool without routing preferences.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity_bytes: u64, relocatable: bool) -> Self {
        Self {
            name: name.into(),
            capacity_bytes,
            relocatable,
            categories: Vec::new(),
            urgencies: Vec::new(),
        }
    }

    /// Adds preferred categories.
    #[must_use]
    pub fn prefer_categories(mut self, categories: &[Category]) -> Self {
        self.categories.extend_from_slice(categories);
        self
    }

    /// Adds preferred urgency tiers.
    #[must_use]
    pub fn prefer_urgencies(mut self, urgencies: &[Urgency]) -> Self {
        self.urgencies.extend_from_slice(urgencies);
        self
    }

    /// Whether this pool declares a preference that the attributes satisfy.
    ///
    /// A pool with no filters prefers nothing; every declared filter must match.
    #[must_use]
    pub fn prefers(&self, attrs: &Attributes) -> bool {
        if self.categories.is_empty() && self.urgencies.is_empty() {
            return false;
        }
        let category_ok = self.categories.is_empty() || self.categories.contains(&attrs.category);
        let urgency_ok = self.urgencies.is_empty() || self.urgencies.contains(&attrs.urgency);
        category_ok && urgency_ok
    }
}

/// Configuration of the pool allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Pools, in routing preference order.
    pub pools: Vec<PoolConfig>,
    /// Name of the pool that receives relocated records.
    pub overflow_pool: String,
    /// Records untouched for longer than this are stale.
    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: u64,
    /// Stale records below this priority are garbage.
    #[serde(default = "default_priority_floor")]
    pub priority_floor: u8,
}

const fn default_staleness_ms() -> u64 {
    DEFAULT_STALENESS_MS
}

const fn default_priority_floor() -> u8 {
    DEFAULT_PRIORITY_FLOOR
}

impl AllocatorConfig {
    /// Creates a config with default GC thresholds.
    #[must_use]
    pub fn new(pools: Vec<PoolConfig>, overflow_pool: impl Into<String>) -> Self {
        Self {
            pools,
            overflow_pool: overflow_pool.into(),
            staleness_ms: DEFAULT_STALENESS_MS,
            priority_floor: DEFAULT_PRIORITY_FLOOR,
        }
    }

    /// Overrides the GC thresholds.
    #[must_use]
    pub fn with_gc(mut self, staleness_ms: u64, priority_floor: u8) -> Self {
        self.staleness_ms = staleness_ms;
        self.priority_floor = priority_floor;
        self
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or a failed validation.
    pub fn from_toml_str(source: &str) -> AllocResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| AllocError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the structural rules the allocator relies on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violated rule.
    pub fn validate(&self) -> AllocResult<()> {
        if self.pools.is_empty() {
            return Err(AllocError::InvalidConfig("at least one pool is required".into()));
        }
        if self.pools.len() > usize::from(u8::MAX) {
            return Err(AllocError::InvalidConfig(format!(
                "too many pools: {} (max {})",
                self.pools.len(),
                u8::MAX
            )));
        }

        let mut seen = HashSet::with_capacity(self.pools.len());
        for pool in &self.pools {
            if !seen.insert(pool.name.as_str()) {
                return Err(AllocError::InvalidConfig(format!(
                    "duplicate pool name: {}",
                    pool.name
                )));
            }
            if pool.capacity_bytes == 0 {
                return Err(AllocError::InvalidConfig(format!(
                    "pool {} has zero capacity",
                    pool.name
                )));
            }
        }

        if !seen.contains(self.overflow_pool.as_str()) {
            return Err(AllocError::InvalidConfig(format!(
                "overflow pool {} is not declared",
                self.overflow_pool
            )));
        }
        if self.pools.iter().all(|p| p.relocatable) {
            return Err(AllocError::InvalidConfig(
                "at least one pool must be non-relocatable".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the search-node arena.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Number of node slots.
    pub capacity: usize,
    /// Exploration constant used when a caller does not supply one.
    #[serde(default = "default_exploration")]
    pub exploration_constant: f64,
    /// Seed fresh slots from cached transpositions.
    #[serde(default)]
    pub seed_from_transpositions: bool,
}

const fn default_exploration() -> f64 {
    DEFAULT_EXPLORATION
}

impl ArenaConfig {
    /// Arena of `capacity` slots with default tuning.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            exploration_constant: DEFAULT_EXPLORATION,
            seed_from_transpositions: false,
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or a failed validation.
    pub fn from_toml_str(source: &str) -> AllocResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| AllocError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks capacity and tuning.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on zero capacity, a capacity the handle
    /// space cannot address, or a negative/non-finite exploration constant.
    pub fn validate(&self) -> AllocResult<()> {
        if self.capacity == 0 {
            return Err(AllocError::InvalidConfig("arena capacity must be positive".into()));
        }
        if u32::try_from(self.capacity).map_or(true, |c| c == u32::MAX) {
            return Err(AllocError::InvalidConfig(format!(
                "arena capacity {} exceeds handle space",
                self.capacity
            )));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(AllocError::InvalidConfig(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration_constant
            )));
        }
        Ok(())
    }
}
