//! Pairwise dependency conflict detection.
//!
//! Before a package is installed, its version requirements are checked
//! against every already-installed package that names the same dependency.
//! Two requirements conflict when no published version of the dependency
//! satisfies both at once. The check is pairwise and non-transitive: it
//! never explores whether a different transitive version assignment would
//! dissolve the conflict.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use sprout_core::types::{Catalog, PackageInfo, VersionRange};

use crate::select::VersionSelector;

/// One unsatisfiable pair of requirements on the same dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyConflict {
    /// The dependency both packages require
    pub dependency: String,
    /// Package being installed
    pub first_package: String,
    /// Its requirement on the dependency
    pub first_range: String,
    /// The installed package (or "<dep> (installed)" for a pinned local version)
    pub second_package: String,
    /// Its requirement on the dependency
    pub second_range: String,
}

impl fmt::Display for DependencyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} needs {}, {} needs {}",
            self.dependency,
            self.first_package,
            self.first_range,
            self.second_package,
            self.second_range
        )
    }
}

/// All conflicts found for one install request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<DependencyConflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyConflict> {
        self.conflicts.iter()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", conflict)?;
        }
        Ok(())
    }
}

/// Detects version conflicts between a candidate install and installed packages
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    /// Dependency name prefixes managed by the external host, never by sprout
    host_prefixes: Vec<String>,
}

impl ConflictDetector {
    pub fn new(host_prefixes: Vec<String>) -> Self {
        Self { host_prefixes }
    }

    /// Whether a dependency is resolved by the host package system
    pub fn is_host_managed(&self, dependency: &str) -> bool {
        self.host_prefixes
            .iter()
            .any(|prefix| dependency.starts_with(prefix.as_str()))
    }

    /// Find every requirement pair on `target`'s dependencies that no
    /// published version can satisfy.
    ///
    /// For each dependency of `target`, the requirement is tested against
    /// the requirement of every installed package naming the same
    /// dependency, and against the locally installed version of the
    /// dependency itself. A dependency absent from the catalog has no
    /// version that satisfies anything, so it conflicts fail-closed.
    pub fn detect(
        &self,
        target: &PackageInfo,
        catalog: &Catalog,
        installed: &[PackageInfo],
    ) -> ConflictReport {
        let mut report = ConflictReport::default();

        for (dep_name, range_expr) in &target.dependencies {
            if self.is_host_managed(dep_name) {
                continue;
            }
            let required = VersionRange::parse(range_expr);

            let selector = catalog
                .get(dep_name)
                .map(|info| VersionSelector::for_package(&info))
                .unwrap_or_default();

            for other in installed {
                if other.name == target.name {
                    continue;
                }
                let Some(other_expr) = other.dependencies.get(dep_name) else {
                    continue;
                };
                let other_range = VersionRange::parse(other_expr);

                if !selector.has_matching_all(&[&required, &other_range]) {
                    debug!(
                        dependency = %dep_name,
                        first = %target.name,
                        second = %other.name,
                        "unsatisfiable requirement pair"
                    );
                    report.conflicts.push(DependencyConflict {
                        dependency: dep_name.clone(),
                        first_package: target.name.clone(),
                        first_range: range_expr.clone(),
                        second_package: other.name.clone(),
                        second_range: other_expr.clone(),
                    });
                }
            }

            // The dependency may itself be installed at a pinned version.
            let local_version = installed
                .iter()
                .find(|pkg| &pkg.name == dep_name)
                .and_then(|pkg| pkg.local_version.clone());
            if let Some(version) = local_version {
                if !required.matches(&version) {
                    report.conflicts.push(DependencyConflict {
                        dependency: dep_name.clone(),
                        first_package: target.name.clone(),
                        first_range: range_expr.clone(),
                        second_package: format!("{} (installed)", dep_name),
                        second_range: version.to_string(),
                    });
                }
            }
        }

        report
    }
}
