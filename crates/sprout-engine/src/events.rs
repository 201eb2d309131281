//! Package lifecycle events

use serde::Serialize;

use sprout_core::types::Version;

/// Events emitted while operations run, delivered over a broadcast channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PackageEvent {
    /// A package finished installing
    Installed { name: String, version: Version },
    /// A package was removed
    Uninstalled { name: String },
    /// Download progress for a package, fraction in `0..=1`
    Progress { name: String, fraction: f32 },
}
