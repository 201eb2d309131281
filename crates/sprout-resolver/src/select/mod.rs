//! Greedy version selection over a package's published versions.
//!
//! Selection is local to a single package: given the set of published
//! versions and a range expression, pick the highest version the range
//! admits. There is no backtracking across packages.

use std::collections::BTreeSet;

use sprout_core::types::{PackageInfo, Version, VersionRange};

/// Picks concrete versions for one package from its published set
#[derive(Debug, Clone, Default)]
pub struct VersionSelector {
    versions: BTreeSet<Version>,
}

impl VersionSelector {
    /// Build a selector over an explicit version set
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Self {
        Self {
            versions: versions.into_iter().collect(),
        }
    }

    /// Build a selector over a catalog entry's published versions
    pub fn for_package(package: &PackageInfo) -> Self {
        Self::new(package.available_versions())
    }

    /// Highest version satisfying the range, if any
    pub fn select_best(&self, range: &VersionRange) -> Option<Version> {
        self.versions
            .iter()
            .rev()
            .find(|version| range.matches(version))
            .cloned()
    }

    /// All versions satisfying the range, ascending
    pub fn find_matching(&self, range: &VersionRange) -> Vec<Version> {
        self.versions
            .iter()
            .filter(|version| range.matches(version))
            .cloned()
            .collect()
    }

    /// Whether any published version satisfies the range
    pub fn has_matching(&self, range: &VersionRange) -> bool {
        self.versions.iter().any(|version| range.matches(version))
    }

    /// Whether a single published version satisfies every range at once.
    ///
    /// This is the intersection test conflict detection relies on: two
    /// requirements only conflict when no version can serve both.
    pub fn has_matching_all(&self, ranges: &[&VersionRange]) -> bool {
        self.versions
            .iter()
            .any(|version| ranges.iter().all(|range| range.matches(version)))
    }

    /// Newest published version regardless of ranges
    pub fn highest_version(&self) -> Option<&Version> {
        self.versions.iter().next_back()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }
}
