//! Version selection and conflict detection for the sprout package engine
//!
//! This crate decides which concrete version satisfies a range expression
//! and detects incompatible dependency requirements before any package is
//! installed.

pub mod conflict;
pub mod select;

// Re-export main types
pub use conflict::{ConflictDetector, ConflictReport, DependencyConflict};
pub use select::VersionSelector;

use sprout_core::error::SproutError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, SproutError>;
