//! In-memory package catalog model.
//!
//! `PackageInfo` entries are created when catalog metadata is fetched and
//! mutated in place when an install or uninstall completes. The `Catalog`
//! wraps a concurrent map so each entry has a single writer at a time;
//! callers holding stale clones see updates on the next lookup.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{Version, VersionRange};

/// Where a dependency is resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageSource {
    /// Not determined
    Unknown,
    /// Resolved by the external host package manager, not this engine
    HostManaged,
    /// Resolved from the managed registry catalog
    Managed,
    /// Resolved from a git URL
    Git,
}

/// One catalog entry for a published version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: Version,
    pub publish_date: Option<String>,
    pub changelog: Option<String>,
    /// Recomputed on every status refresh
    pub is_installed: bool,
}

/// Metadata for one package in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub author: Option<String>,
    pub author_url: Option<String>,
    /// Latest version published to the catalog
    pub newest_version: Version,
    /// Installed version, if any
    pub local_version: Option<Version>,
    /// Available versions, ascending
    pub versions: Vec<VersionInfo>,
    /// Dependency name -> range expression; never contains this package's own name
    pub dependencies: BTreeMap<String, String>,
    pub source: PackageSource,
}

impl PackageInfo {
    pub fn is_installed(&self) -> bool {
        self.local_version.is_some()
    }

    pub fn has_update(&self) -> bool {
        match &self.local_version {
            Some(local) => self.newest_version > *local,
            None => false,
        }
    }

    /// All available versions, for range selection
    pub fn available_versions(&self) -> Vec<Version> {
        self.versions.iter().map(|v| v.version.clone()).collect()
    }

    /// Record a completed install of `version` on this entry
    pub fn mark_installed(&mut self, version: Version) {
        for info in &mut self.versions {
            info.is_installed = info.version == version;
        }
        self.local_version = Some(version);
    }

    /// Record a completed uninstall on this entry
    pub fn mark_uninstalled(&mut self) {
        for info in &mut self.versions {
            info.is_installed = false;
        }
        self.local_version = None;
    }
}

/// Transient result of a dependency status query
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub package_name: String,
    /// The caller's range expression
    pub required_range: String,
    pub installed_version: Option<Version>,
    pub is_installed: bool,
    /// Whether the installed version satisfies the required range
    pub is_compatible: bool,
    pub source: PackageSource,
    /// Matching catalog entry, for navigation
    pub package: Option<PackageInfo>,
}

impl DependencyStatus {
    /// Compute the status of `name` required at `range_expr` against the catalog
    pub fn query(name: &str, range_expr: &str, catalog: &Catalog) -> Self {
        let package = catalog.get(name);
        let installed_version = package.as_ref().and_then(|p| p.local_version.clone());
        let range = VersionRange::parse(range_expr);
        let is_compatible = installed_version
            .as_ref()
            .map(|v| range.matches(v))
            .unwrap_or(false);

        Self {
            package_name: name.to_string(),
            required_range: range_expr.to_string(),
            is_installed: installed_version.is_some(),
            installed_version,
            is_compatible,
            source: package
                .as_ref()
                .map(|p| p.source)
                .unwrap_or(PackageSource::Unknown),
            package,
        }
    }
}

/// The set of all known packages, keyed by name
#[derive(Debug, Default)]
pub struct Catalog {
    packages: DashMap<String, PackageInfo>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            packages: DashMap::new(),
        }
    }

    /// Snapshot of one entry
    pub fn get(&self, name: &str) -> Option<PackageInfo> {
        self.packages.get(name).map(|entry| entry.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn insert(&self, package: PackageInfo) {
        self.packages.insert(package.name.clone(), package);
    }

    /// Mutate one entry in place under its entry lock
    pub fn update<F>(&self, name: &str, apply: F) -> bool
    where
        F: FnOnce(&mut PackageInfo),
    {
        match self.packages.get_mut(name) {
            Some(mut entry) => {
                apply(&mut entry);
                true
            },
            None => false,
        }
    }

    /// Snapshot of every entry
    pub fn all(&self) -> Vec<PackageInfo> {
        self.packages.iter().map(|entry| entry.clone()).collect()
    }

    /// Snapshot of every installed entry
    pub fn installed(&self) -> Vec<PackageInfo> {
        self.packages
            .iter()
            .filter(|entry| entry.is_installed())
            .map(|entry| entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn clear(&self) {
        self.packages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package(name: &str, newest: &str, versions: &[&str]) -> PackageInfo {
        PackageInfo {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            author: None,
            author_url: None,
            newest_version: newest.parse().unwrap(),
            local_version: None,
            versions: versions
                .iter()
                .map(|v| VersionInfo {
                    version: v.parse().unwrap(),
                    publish_date: None,
                    changelog: None,
                    is_installed: false,
                })
                .collect(),
            dependencies: BTreeMap::new(),
            source: PackageSource::Managed,
        }
    }

    #[test]
    fn test_install_state_transitions() {
        let mut pkg = sample_package("logger", "2.0.0", &["1.0.0", "2.0.0"]);
        assert!(!pkg.is_installed());
        assert!(!pkg.has_update());

        pkg.mark_installed("1.0.0".parse().unwrap());
        assert!(pkg.is_installed());
        assert!(pkg.has_update());
        assert!(pkg.versions[0].is_installed);
        assert!(!pkg.versions[1].is_installed);

        pkg.mark_installed("2.0.0".parse().unwrap());
        assert!(!pkg.has_update());

        pkg.mark_uninstalled();
        assert!(!pkg.is_installed());
        assert!(!pkg.has_update());
        assert!(pkg.versions.iter().all(|v| !v.is_installed));
    }

    #[test]
    fn test_catalog_update_in_place() {
        let catalog = Catalog::new();
        catalog.insert(sample_package("logger", "1.0.0", &["1.0.0"]));

        let updated = catalog.update("logger", |pkg| {
            pkg.mark_installed("1.0.0".parse().unwrap());
        });
        assert!(updated);
        assert!(catalog.get("logger").unwrap().is_installed());
        assert_eq!(catalog.installed().len(), 1);

        assert!(!catalog.update("missing", |_| {}));
    }

    #[test]
    fn test_dependency_status_query() {
        let catalog = Catalog::new();
        let mut pkg = sample_package("logger", "1.5.0", &["1.0.0", "1.5.0"]);
        pkg.mark_installed("1.0.0".parse().unwrap());
        catalog.insert(pkg);

        let status = DependencyStatus::query("logger", "^1.2.0", &catalog);
        assert!(status.is_installed);
        assert!(!status.is_compatible);
        assert_eq!(status.installed_version, Some("1.0.0".parse().unwrap()));
        assert_eq!(status.source, PackageSource::Managed);
        assert!(status.package.is_some());

        let status = DependencyStatus::query("logger", "^1.0.0", &catalog);
        assert!(status.is_compatible);

        let status = DependencyStatus::query("missing", "*", &catalog);
        assert!(!status.is_installed);
        assert!(!status.is_compatible);
        assert_eq!(status.source, PackageSource::Unknown);
    }
}
