//! # Service Configuration
//!
//! One TOML file configures both components:
//!
//! ```toml
//! [allocator]
//! overflow_pool = "overflow"
//!
//! [[allocator.pools]]
//! name = "working"
//! capacity_bytes = 4096
//! relocatable = true
//!
//! [[allocator.pools]]
//! name = "overflow"
//! capacity_bytes = 8192
//!
//! [arena]
//! capacity = 1024
//! ```

use std::path::Path;

use docpool_core::{AllocatorConfig, ArenaConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

/// Configuration for a document service and a planning service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Pool layout and GC thresholds.
    pub allocator: AllocatorConfig,
    /// Arena sizing and UCB tuning.
    pub arena: ArenaConfig,
}

impl ServiceConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// - `ConfigParse` if the document does not match the schema
    /// - `Alloc(InvalidConfig)` if either section fails validation
    pub fn from_toml_str(source: &str) -> ServiceResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.allocator.validate()?;
        config.arena.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigIo` if the file cannot be read, otherwise the errors
    /// of [`ServiceConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ServiceError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        info!(
            "Loaded config from {}: {} pools, arena capacity {}",
            path.display(),
            config.allocator.pools.len(),
            config.arena.capacity
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpool_core::AllocError;

    const SAMPLE: &str = r#"
        [allocator]
        overflow_pool = "overflow"
        staleness_ms = 1000

        [[allocator.pools]]
        name = "working"
        capacity_bytes = 4096
        relocatable = true
        categories = ["evidence", "precedent"]

        [[allocator.pools]]
        name = "overflow"
        capacity_bytes = 8192

        [arena]
        capacity = 64
        seed_from_transpositions = true
    "#;

    #[test]
    fn test_parse_sample() {
        let config = ServiceConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.allocator.pools.len(), 2);
        assert_eq!(config.allocator.staleness_ms, 1000);
        assert_eq!(config.allocator.priority_floor, 128);
        assert_eq!(config.arena.capacity, 64);
        assert!(config.arena.seed_from_transpositions);
        assert!((config.arena.exploration_constant - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_semantic_errors_surface_as_alloc() {
        let bad = SAMPLE.replace("capacity = 64", "capacity = 0");
        let err = ServiceConfig::from_toml_str(&bad).unwrap_err();
        assert!(matches!(err, ServiceError::Alloc(AllocError::InvalidConfig(_))));
    }

    #[test]
    fn test_syntax_errors_surface_as_parse() {
        let err = ServiceConfig::from_toml_str("[allocator").unwrap_err();
        assert!(matches!(err, ServiceError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ServiceConfig::from_file("/nonexistent/docpool.toml").unwrap_err();
        assert!(matches!(err, ServiceError::ConfigIo { .. }));
    }
}
