//! Registry client for the sprout package engine
//!
//! This crate provides HTTP client functionality for fetching catalog
//! metadata and package archives from a sprout registry with connection
//! pooling, retry logic, and TTL caching.

pub mod api;
pub mod cache;
pub mod client;

// Re-export main types
pub use api::{AuthorInfo, CatalogResponse, DistInfo, PackageEntry, VersionEntry};
pub use cache::{CacheEntry, CacheStats, MetadataCache};
pub use client::{RegistryClient, RetryConfig};

use sprout_core::error::SproutError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, SproutError>;
