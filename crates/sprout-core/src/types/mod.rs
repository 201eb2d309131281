//! Core data types for the package engine.

pub mod catalog;
pub mod range;
pub mod version;

pub use catalog::{Catalog, DependencyStatus, PackageInfo, PackageSource, VersionInfo};
pub use range::VersionRange;
pub use version::Version;
