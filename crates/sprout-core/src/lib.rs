//! # sprout-core
//!
//! Core types shared across all sprout crates.
//!
//! This crate provides:
//! - Version and VersionRange types implementing the npm-style range grammar
//! - The in-memory package catalog model (PackageInfo, VersionInfo, Catalog)
//! - SproutError enum for unified error handling

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SproutError, SproutResult};
pub use types::{
    Catalog, DependencyStatus, PackageInfo, PackageSource, Version, VersionInfo, VersionRange,
};
