//! Install pipeline and operation orchestration for the sprout package engine
//!
//! This crate owns the side-effecting half of the engine: downloading and
//! extracting archives, installing and uninstalling package directories,
//! and orchestrating recursive dependency installs with conflict checks,
//! bounded concurrency, and progress events.

pub mod archive;
pub mod config;
pub mod events;
pub mod installer;
pub mod manager;
pub mod policy;

// Re-export main types
pub use config::EngineConfig;
pub use events::PackageEvent;
pub use installer::{HostHooks, NoopHooks, PackageInstaller};
pub use manager::{InstallReport, OperationManager};
pub use policy::{AutoApprove, AutoReject, ConflictDecision, ConflictPolicy};

use sprout_core::error::SproutError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, SproutError>;
