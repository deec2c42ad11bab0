//! # Service Error Types
//!
//! Everything the facade can fail with: allocator outcomes plus the
//! config and snapshot I/O around them.

use std::path::PathBuf;

use docpool_core::AllocError;
use thiserror::Error;

/// Errors that can occur in the services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// An allocator or arena operation failed.
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `ServiceConfig`.
    #[error("malformed config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A snapshot could not be rendered as TOML.
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
