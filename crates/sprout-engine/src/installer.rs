//! Download / extract / install / uninstall pipeline.
//!
//! The installer owns every filesystem side effect. Installs are
//! replace-in-place: an existing package directory is deleted before the
//! extracted tree is copied in, so a crash mid-replace leaves the package
//! uninstalled rather than corrupted in place. There is no rollback of
//! files already written.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};
use walkdir::WalkDir;

use sprout_core::error::SproutError;
use sprout_core::types::Version;
use sprout_registry::RegistryClient;

use crate::archive::extract_archive;
use crate::EngineResult;

/// Sidecar manifest written next to each installed package directory
const SIDECAR_SUFFIX: &str = ".sprout.json";

/// Host integration points invoked after filesystem changes
pub trait HostHooks: Send + Sync {
    /// Called after an install or uninstall changes the package tree
    fn refresh_asset_index(&self) {}
}

/// Hooks implementation that does nothing, for tests and headless use
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl HostHooks for NoopHooks {}

/// Executes package install and uninstall side effects
pub struct PackageInstaller {
    registry: Arc<RegistryClient>,
    install_root: Utf8PathBuf,
    hooks: Arc<dyn HostHooks>,
}

impl PackageInstaller {
    pub fn new(
        registry: Arc<RegistryClient>,
        install_root: Utf8PathBuf,
        hooks: Arc<dyn HostHooks>,
    ) -> Self {
        Self {
            registry,
            install_root,
            hooks,
        }
    }

    pub fn install_root(&self) -> &Utf8Path {
        &self.install_root
    }

    /// Directory a package occupies once installed
    pub fn package_dir(&self, name: &str) -> Utf8PathBuf {
        self.install_root.join(name)
    }

    fn sidecar_path(&self, name: &str) -> Utf8PathBuf {
        self.install_root.join(format!("{}{}", name, SIDECAR_SUFFIX))
    }

    /// Download, extract, and install `name@version`.
    ///
    /// `tarball_url` is the per-version archive URL from the catalog
    /// metadata, when published. No filesystem changes happen until
    /// download and extraction have both succeeded. The replace of an
    /// existing install is not atomic.
    pub async fn install(
        &self,
        name: &str,
        version: &Version,
        tarball_url: Option<&str>,
        progress: &(dyn Fn(f32) + Send + Sync),
        cancel: &watch::Receiver<bool>,
    ) -> EngineResult<()> {
        debug!(package = %name, %version, "downloading archive");
        let bytes = self
            .registry
            .download_archive(name, version, tarball_url, progress, cancel)
            .await?;

        let scratch = tempfile::tempdir()
            .map_err(|e| SproutError::io("Failed to create scratch directory".to_string(), e))?;
        extract_archive(name, Cursor::new(bytes), scratch.path())?;

        // Registry tarballs root their contents under a `package/` directory.
        let packaged = scratch.path().join("package");
        let source = if packaged.is_dir() {
            packaged
        } else {
            scratch.path().to_path_buf()
        };

        let target = self.package_dir(name);
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| {
                SproutError::io(format!("Failed to remove existing '{}'", target), e)
            })?;
        }
        copy_tree(name, &source, target.as_std_path())?;

        let sidecar = serde_json::json!({ "name": name, "version": version });
        let sidecar_text =
            serde_json::to_string_pretty(&sidecar).map_err(|e| SproutError::Install {
                package: name.to_string(),
                message: format!("failed to serialize manifest: {}", e),
            })?;
        fs::write(self.sidecar_path(name).as_std_path(), sidecar_text)
            .map_err(|e| SproutError::io("Failed to write sidecar manifest".to_string(), e))?;

        self.hooks.refresh_asset_index();
        info!(package = %name, %version, "installed");
        Ok(())
    }

    /// Remove an installed package directory and its sidecar manifest
    pub fn uninstall(&self, name: &str) -> EngineResult<()> {
        let target = self.package_dir(name);
        if !target.exists() {
            return Err(SproutError::State {
                message: format!("package '{}' is not installed at {}", name, target),
            });
        }

        fs::remove_dir_all(&target)
            .map_err(|e| SproutError::io(format!("Failed to remove '{}'", target), e))?;

        let sidecar = self.sidecar_path(name);
        if sidecar.exists() {
            fs::remove_file(&sidecar)
                .map_err(|e| SproutError::io(format!("Failed to remove '{}'", sidecar), e))?;
        }

        self.hooks.refresh_asset_index();
        info!(package = %name, "uninstalled");
        Ok(())
    }

    /// Whether a package directory exists under the install root
    pub fn is_installed(&self, name: &str) -> bool {
        self.package_dir(name).is_dir()
    }

    /// Installed version of a package, read from the sidecar manifest and
    /// falling back to the package's own manifest. Parse failures yield
    /// `None` ("unknown version"), never a hard error.
    pub fn installed_version(&self, name: &str) -> Option<Version> {
        if !self.is_installed(name) {
            return None;
        }

        read_manifest_version(self.sidecar_path(name).as_std_path())
            .or_else(|| read_manifest_version(self.package_dir(name).join("package.json").as_std_path()))
    }
}

/// Pull the `version` field out of a JSON manifest, leniently
fn read_manifest_version(path: &Path) -> Option<Version> {
    let content = fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    value.get("version")?.as_str()?.parse().ok()
}

/// Recursively copy a directory tree
fn copy_tree(package: &str, src: &Path, dst: &Path) -> EngineResult<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| SproutError::Install {
            package: package.to_string(),
            message: format!("copy failed: {}", e),
        })?;
        let relative = entry.path().strip_prefix(src).map_err(|e| SproutError::Install {
            package: package.to_string(),
            message: format!("copy failed: {}", e),
        })?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| SproutError::io("Failed to create directory".to_string(), e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| SproutError::io("Failed to create directory".to_string(), e))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| SproutError::io("Failed to copy file".to_string(), e))?;
        }
    }
    Ok(())
}
