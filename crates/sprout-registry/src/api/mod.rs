//! Registry API response types.
//!
//! The catalog endpoint returns a root JSON object keyed by package name.
//! Each entry carries `dist-tags.latest`, a `versions` map keyed by version
//! string, and a `time` map of per-version publish timestamps. Responses are
//! deserialized into typed structs at the boundary so malformed metadata
//! fails fast instead of producing null fields downstream.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use sprout_core::error::SproutError;
use sprout_core::types::{PackageInfo, PackageSource, Version, VersionInfo};

/// Full catalog response: package name -> metadata
pub type CatalogResponse = BTreeMap<String, PackageEntry>;

/// Metadata for one package as returned by the registry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageEntry {
    /// Package name
    pub name: String,
    /// Package description
    #[serde(default)]
    pub description: Option<String>,
    /// Tag -> version, `latest` names the newest release
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// Per-version metadata keyed by version string
    pub versions: BTreeMap<String, VersionEntry>,
    /// Per-version publish timestamps
    #[serde(default)]
    pub time: HashMap<String, String>,
    /// Package author
    #[serde(default)]
    pub author: Option<AuthorInfo>,
}

/// Metadata for a specific published version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionEntry {
    /// Version string
    pub version: String,
    /// Human-readable label
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    /// Version description
    #[serde(default)]
    pub description: Option<String>,
    /// Author of this version
    #[serde(default)]
    pub author: Option<AuthorInfo>,
    /// Dependency name -> range expression
    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, String>>,
    /// Changelog for this release
    #[serde(default)]
    pub changelog: Option<String>,
    /// Distribution info
    #[serde(default)]
    pub dist: Option<DistInfo>,
}

/// Package author information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Distribution information for a package archive
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistInfo {
    /// Archive download URL
    pub tarball: String,
    /// Unpacked size in bytes
    #[serde(rename = "unpackedSize", default)]
    pub unpacked_size: Option<u64>,
}

impl PackageEntry {
    /// Convert a registry entry into the in-memory catalog model.
    ///
    /// Every version string must parse; a single malformed version fails the
    /// whole entry rather than silently dropping it.
    pub fn into_package_info(self) -> Result<PackageInfo, SproutError> {
        let mut versions = Vec::with_capacity(self.versions.len());
        for (version_str, entry) in &self.versions {
            let version: Version =
                version_str
                    .parse()
                    .map_err(|_| SproutError::Catalog {
                        message: format!(
                            "package '{}' has malformed version '{}'",
                            self.name, version_str
                        ),
                    })?;
            versions.push(VersionInfo {
                version,
                publish_date: self.time.get(version_str).cloned(),
                changelog: entry.changelog.clone(),
                is_installed: false,
            });
        }
        versions.sort_by(|a, b| a.version.cmp(&b.version));

        let newest_version = match self.dist_tags.get("latest") {
            Some(tag) => tag.parse().map_err(|_| SproutError::Catalog {
                message: format!(
                    "package '{}' has malformed latest tag '{}'",
                    self.name, tag
                ),
            })?,
            None => versions
                .last()
                .map(|info| info.version.clone())
                .ok_or_else(|| SproutError::Catalog {
                    message: format!("package '{}' has no published versions", self.name),
                })?,
        };

        let latest_entry = self
            .versions
            .iter()
            .find(|(v, _)| {
                v.parse::<Version>()
                    .map(|parsed| parsed == newest_version)
                    .unwrap_or(false)
            })
            .map(|(_, entry)| entry);

        // Dependencies never include the package's own name.
        let mut dependencies = latest_entry
            .and_then(|entry| entry.dependencies.clone())
            .unwrap_or_default();
        dependencies.remove(&self.name);

        let author = latest_entry
            .and_then(|entry| entry.author.clone())
            .or(self.author);

        Ok(PackageInfo {
            display_name: latest_entry
                .and_then(|entry| entry.display_name.clone())
                .unwrap_or_else(|| self.name.clone()),
            description: latest_entry
                .and_then(|entry| entry.description.clone())
                .or(self.description)
                .unwrap_or_default(),
            author_url: author.as_ref().and_then(|a| a.url.clone()),
            author: author.and_then(|a| a.name),
            name: self.name,
            newest_version,
            local_version: None,
            versions,
            dependencies,
            source: PackageSource::Managed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> PackageEntry {
        serde_json::from_value(serde_json::json!({
            "name": "logger",
            "description": "Structured logging",
            "dist-tags": { "latest": "1.1.0" },
            "versions": {
                "1.0.0": {
                    "version": "1.0.0",
                    "dist": { "tarball": "https://registry.test/logger/-/logger-1.0.0.tgz" }
                },
                "1.1.0": {
                    "version": "1.1.0",
                    "displayName": "Logger",
                    "dependencies": { "colors": "^2.0.0" },
                    "changelog": "Adds sinks",
                    "dist": { "tarball": "https://registry.test/logger/-/logger-1.1.0.tgz" }
                }
            },
            "time": {
                "1.0.0": "2023-01-01T00:00:00.000Z",
                "1.1.0": "2023-06-01T00:00:00.000Z"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_into_package_info() {
        let info = sample_entry().into_package_info().unwrap();
        assert_eq!(info.name, "logger");
        assert_eq!(info.display_name, "Logger");
        assert_eq!(info.newest_version, "1.1.0".parse().unwrap());
        assert_eq!(info.versions.len(), 2);
        assert_eq!(info.versions[0].version, "1.0.0".parse().unwrap());
        assert_eq!(
            info.versions[1].publish_date.as_deref(),
            Some("2023-06-01T00:00:00.000Z")
        );
        assert_eq!(info.dependencies.get("colors").unwrap(), "^2.0.0");
        assert!(!info.is_installed());
    }

    #[test]
    fn test_malformed_version_fails_fast() {
        let mut entry = sample_entry();
        let bad = entry.versions.get("1.0.0").unwrap().clone();
        entry.versions.insert("not-a-version".to_string(), bad);

        let result = entry.into_package_info();
        assert!(matches!(result, Err(SproutError::Catalog { .. })));
    }

    #[test]
    fn test_self_dependency_is_stripped() {
        let mut entry = sample_entry();
        entry
            .versions
            .get_mut("1.1.0")
            .unwrap()
            .dependencies
            .get_or_insert_with(BTreeMap::new)
            .insert("logger".to_string(), "^1.0.0".to_string());

        let info = entry.into_package_info().unwrap();
        assert!(!info.dependencies.contains_key("logger"));
        assert!(info.dependencies.contains_key("colors"));
    }

    #[test]
    fn test_missing_latest_tag_falls_back_to_max() {
        let mut entry = sample_entry();
        entry.dist_tags.clear();

        let info = entry.into_package_info().unwrap();
        assert_eq!(info.newest_version, "1.1.0".parse().unwrap());
    }
}
