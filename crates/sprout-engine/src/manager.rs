//! Operation orchestration: conflict checks, recursive dependency
//! resolution, and install/uninstall sequencing.
//!
//! The manager is an explicit context object constructed once per process
//! (or per test) and passed to callers; there is no global state. Resolution
//! is greedy and depth-first with no backtracking: every dependency is fully
//! installed before its dependent, enforced by post-order recursion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, watch, Mutex, Semaphore};
use tracing::{debug, info, warn};

use sprout_core::error::SproutError;
use sprout_core::types::{Catalog, DependencyStatus, PackageInfo, Version, VersionRange};
use sprout_registry::{MetadataCache, RegistryClient};
use sprout_resolver::{ConflictDetector, VersionSelector};

use crate::config::EngineConfig;
use crate::events::PackageEvent;
use crate::installer::{HostHooks, PackageInstaller};
use crate::policy::{ConflictDecision, ConflictPolicy};
use crate::EngineResult;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Outcome of one `install_package` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallReport {
    /// Packages installed this call, dependency-first order
    pub installed: Vec<(String, Version)>,
    /// Packages already satisfied and left untouched
    pub skipped: Vec<String>,
    /// Dependencies that failed and were skipped best-effort
    pub failed_dependencies: Vec<String>,
}

impl InstallReport {
    /// True when the call performed no install work at all
    pub fn is_noop(&self) -> bool {
        self.installed.is_empty() && self.failed_dependencies.is_empty()
    }
}

/// Orchestrates package operations against one catalog and install root
pub struct OperationManager {
    registry: Arc<RegistryClient>,
    catalog: Arc<Catalog>,
    installer: PackageInstaller,
    detector: ConflictDetector,
    policy: Arc<dyn ConflictPolicy>,
    events: broadcast::Sender<PackageEvent>,
    install_permits: Arc<Semaphore>,
    // Single-flight per package name: concurrent operations on the same
    // package serialize on its entry here.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    metadata_cache: MetadataCache,
    cache_ttl: std::time::Duration,
}

impl OperationManager {
    pub fn new(
        config: &EngineConfig,
        policy: Arc<dyn ConflictPolicy>,
        hooks: Arc<dyn HostHooks>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let registry = Arc::new(RegistryClient::new(config.registry_url.clone())?);
        let installer = PackageInstaller::new(
            Arc::clone(&registry),
            config.install_root.clone(),
            hooks,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Ok(Self {
            registry,
            catalog: Arc::new(Catalog::new()),
            installer,
            detector: ConflictDetector::new(config.host_prefixes.clone()),
            policy,
            events,
            install_permits: Arc::new(Semaphore::new(config.max_concurrent_installs)),
            in_flight: DashMap::new(),
            cancel_tx,
            cancel_rx,
            metadata_cache: MetadataCache::new(),
            cache_ttl: config.cache_ttl(),
        })
    }

    /// Subscribe to package lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<PackageEvent> {
        self.events.subscribe()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Signal cancellation to all in-flight downloads
    pub fn cancel_downloads(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Fetch the full catalog and rebuild the in-memory model.
    ///
    /// A malformed individual entry is logged and skipped so one bad package
    /// cannot empty the catalog. Install state is recomputed from the
    /// install root on every refresh.
    pub async fn refresh_catalog(&self) -> EngineResult<()> {
        let response = self.registry.fetch_catalog().await?;
        debug!(packages = response.len(), "catalog fetched");

        self.catalog.clear();
        for (name, entry) in response {
            self.metadata_cache
                .insert_with_ttl(name.clone(), entry.clone(), self.cache_ttl);

            let mut info = match entry.into_package_info() {
                Ok(info) => info,
                Err(error) => {
                    warn!(package = %name, %error, "skipping malformed catalog entry");
                    continue;
                },
            };
            if let Some(version) = self.installer.installed_version(&name) {
                info.mark_installed(version);
            }
            self.catalog.insert(info);
        }
        Ok(())
    }

    /// Detail view for one package, served from the metadata cache when fresh
    pub async fn package_detail(&self, name: &str) -> EngineResult<PackageInfo> {
        let entry = match self.metadata_cache.get(name) {
            Some(entry) => entry,
            None => {
                let entry = self.registry.fetch_package(name).await?;
                self.metadata_cache
                    .insert_with_ttl(name.to_string(), entry.clone(), self.cache_ttl);
                entry
            },
        };

        let mut info = entry.into_package_info()?;
        if let Some(version) = self.installer.installed_version(name) {
            info.mark_installed(version);
        }
        self.catalog.insert(info.clone());
        Ok(info)
    }

    /// Compatibility status of `name` against a required range
    pub fn dependency_status(&self, name: &str, range_expr: &str) -> DependencyStatus {
        DependencyStatus::query(name, range_expr, &self.catalog)
    }

    /// Install `name`, resolving and installing its dependency tree first.
    ///
    /// `version` pins an explicit published version; `None` installs the
    /// newest. Conflicts found up front are put to the policy; an abort
    /// decision returns `OperationAborted` with zero side effects.
    pub async fn install_package(
        &self,
        name: &str,
        version: Option<Version>,
    ) -> EngineResult<InstallReport> {
        // A fresh operation clears any previous cancellation signal.
        let _ = self.cancel_tx.send(false);

        let target = self
            .catalog
            .get(name)
            .ok_or_else(|| SproutError::PackageNotFound {
                name: name.to_string(),
            })?;

        let desired = match version {
            Some(version) => {
                if !target.available_versions().contains(&version) {
                    return Err(SproutError::NoMatchingVersion {
                        package: name.to_string(),
                        range: version.to_string(),
                    });
                }
                version
            },
            None => target.newest_version.clone(),
        };

        let installed = self.catalog.installed();
        let conflicts = self.detector.detect(&target, &self.catalog, &installed);
        if !conflicts.is_empty() {
            info!(package = %name, count = conflicts.len(), "conflicts detected");
            match self.policy.resolve_conflicts(&conflicts.conflicts) {
                ConflictDecision::Proceed => {},
                ConflictDecision::Abort => return Err(SproutError::OperationAborted),
            }
        }

        let mut report = InstallReport::default();
        let mut resolving = Vec::new();
        self.install_recursive(name.to_string(), desired, &mut resolving, &mut report)
            .await?;
        Ok(report)
    }

    /// Post-order recursive install with an explicit resolving stack.
    ///
    /// A package already on the stack means a dependency cycle; that error
    /// propagates rather than being absorbed by the best-effort dependency
    /// handling, since continuing would install an arbitrary cycle cut.
    fn install_recursive<'a>(
        &'a self,
        name: String,
        version: Version,
        resolving: &'a mut Vec<String>,
        report: &'a mut InstallReport,
    ) -> Pin<Box<dyn Future<Output = EngineResult<()>> + Send + 'a>> {
        Box::pin(async move {
            if resolving.contains(&name) {
                let mut cycle = resolving.clone();
                cycle.push(name.clone());
                return Err(SproutError::CircularDependency {
                    cycle: cycle.join(" -> "),
                });
            }

            let info = self
                .catalog
                .get(&name)
                .ok_or_else(|| SproutError::PackageNotFound { name: name.clone() })?;

            // Already satisfied at the desired version: zero work.
            if info.local_version.as_ref() == Some(&version) {
                if !report.skipped.contains(&name) {
                    report.skipped.push(name);
                }
                return Ok(());
            }

            resolving.push(name.clone());

            for (dep_name, range_expr) in &info.dependencies {
                if self.detector.is_host_managed(dep_name) {
                    debug!(dependency = %dep_name, "host-managed, skipping");
                    continue;
                }

                let range = VersionRange::parse(range_expr);
                let Some(dep_info) = self.catalog.get(dep_name) else {
                    warn!(dependency = %dep_name, "not in catalog, skipping");
                    report.failed_dependencies.push(dep_name.clone());
                    continue;
                };

                // Installed and range-compatible: nothing to do.
                if let Some(installed) = &dep_info.local_version {
                    if range.matches(installed) {
                        if !report.skipped.contains(dep_name) {
                            report.skipped.push(dep_name.clone());
                        }
                        continue;
                    }
                }

                let selector = VersionSelector::for_package(&dep_info);
                let best = match selector.select_best(&range) {
                    Some(best) => best,
                    None => match selector.highest_version() {
                        // Lenient resolution: no satisfying version falls
                        // back to the newest available with a warning.
                        Some(newest) => {
                            warn!(
                                dependency = %dep_name,
                                range = %range_expr,
                                fallback = %newest,
                                "no version satisfies range, using newest"
                            );
                            newest.clone()
                        },
                        None => {
                            warn!(dependency = %dep_name, "no published versions");
                            report.failed_dependencies.push(dep_name.clone());
                            continue;
                        },
                    },
                };

                match self
                    .install_recursive(dep_name.clone(), best, resolving, report)
                    .await
                {
                    Ok(()) => {},
                    Err(error @ SproutError::CircularDependency { .. }) => {
                        resolving.pop();
                        return Err(error);
                    },
                    // Best-effort: one failed dependency does not abort the
                    // remaining declared dependencies.
                    Err(error) => {
                        warn!(dependency = %dep_name, %error, "dependency install failed");
                        report.failed_dependencies.push(dep_name.clone());
                    },
                }
            }

            let result = self.install_one(&name, &version, report).await;
            resolving.pop();
            result
        })
    }

    /// Install a single package under the concurrency bound and its
    /// per-package single-flight lock.
    async fn install_one(
        &self,
        name: &str,
        version: &Version,
        report: &mut InstallReport,
    ) -> EngineResult<()> {
        let lock = self
            .in_flight
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _flight = lock.lock().await;

        // Another operation may have installed it while we waited.
        if let Some(info) = self.catalog.get(name) {
            if info.local_version.as_ref() == Some(version) {
                if !report.skipped.contains(&name.to_string()) {
                    report.skipped.push(name.to_string());
                }
                return Ok(());
            }
        }

        let _permit = self
            .install_permits
            .acquire()
            .await
            .map_err(|_| SproutError::OperationAborted)?;

        let events = self.events.clone();
        let progress_name = name.to_string();
        let progress = move |fraction: f32| {
            let _ = events.send(PackageEvent::Progress {
                name: progress_name.clone(),
                fraction,
            });
        };

        // Prefer the archive URL published in the package metadata.
        let tarball_url = self.metadata_cache.get(name).and_then(|entry| {
            entry
                .versions
                .get(&version.to_string())
                .and_then(|v| v.dist.as_ref().map(|dist| dist.tarball.clone()))
        });

        self.installer
            .install(name, version, tarball_url.as_deref(), &progress, &self.cancel_rx)
            .await?;

        self.catalog.update(name, |info| {
            info.mark_installed(version.clone());
        });
        let _ = self.events.send(PackageEvent::Installed {
            name: name.to_string(),
            version: version.clone(),
        });
        report.installed.push((name.to_string(), version.clone()));
        Ok(())
    }

    /// Uninstall `name` after the policy confirms the removal
    pub async fn uninstall_package(&self, name: &str) -> EngineResult<()> {
        if !self.catalog.contains(name) {
            return Err(SproutError::PackageNotFound {
                name: name.to_string(),
            });
        }
        if !self.policy.confirm_uninstall(name) {
            return Err(SproutError::OperationAborted);
        }

        let lock = self
            .in_flight
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _flight = lock.lock().await;

        self.installer.uninstall(name)?;
        self.catalog.update(name, |info| info.mark_uninstalled());
        let _ = self.events.send(PackageEvent::Uninstalled {
            name: name.to_string(),
        });
        Ok(())
    }
}
