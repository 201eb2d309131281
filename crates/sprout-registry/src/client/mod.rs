//! HTTP client implementation with connection pooling and retry logic

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tokio::sync::watch;
use tracing::debug;

use crate::api::{CatalogResponse, PackageEntry};
use crate::RegistryResult;
use sprout_core::error::SproutError;
use sprout_core::types::Version;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// HTTP client for registry catalog and archive operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Base registry URL
    base_url: String,
}

impl RegistryClient {
    /// Create a new registry client against the given base URL
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_config(base_url.into(), RetryConfig::default())
    }

    /// Create a registry client with custom retry configuration
    pub fn with_config(base_url: String, retry_config: RetryConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("sprout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SproutError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            retry_config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Execute an HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Missing packages and caller aborts never resolve on retry
                    let fatal = matches!(
                        error,
                        SproutError::PackageNotFound { .. } | SproutError::OperationAborted
                    );
                    last_error = Some(error);

                    if fatal || attempt == self.retry_config.max_retries {
                        break;
                    }

                    debug!(attempt, ?delay, "registry request failed, retrying");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }

        Err(last_error.unwrap_or_else(|| SproutError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// Fetch the full catalog: a root object keyed by package name
    pub async fn fetch_catalog(&self) -> RegistryResult<CatalogResponse> {
        let url = format!("{}/-/all", self.base_url);

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| SproutError::network("Failed to fetch catalog".to_string(), e))?;

            if !response.status().is_success() {
                return Err(SproutError::Catalog {
                    message: format!("registry returned status {}", response.status()),
                });
            }

            response
                .json::<CatalogResponse>()
                .await
                .map_err(|e| SproutError::Catalog {
                    message: format!("failed to parse catalog response: {}", e),
                })
        })
        .await
    }

    /// Fetch metadata for a single package
    pub async fn fetch_package(&self, package_name: &str) -> RegistryResult<PackageEntry> {
        let url = format!("{}/{}", self.base_url, package_name);

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| SproutError::network("Failed to fetch metadata".to_string(), e))?;

            match response.status() {
                reqwest::StatusCode::OK => {
                    response
                        .json::<PackageEntry>()
                        .await
                        .map_err(|e| SproutError::Catalog {
                            message: format!("failed to parse metadata: {}", e),
                        })
                },
                reqwest::StatusCode::NOT_FOUND => Err(SproutError::PackageNotFound {
                    name: package_name.to_string(),
                }),
                status => Err(SproutError::Network {
                    message: format!("registry returned status {} for {}", status, package_name),
                    source: None,
                }),
            }
        })
        .await
    }

    /// Default archive URL for a name@version pair
    pub fn archive_url(&self, name: &str, version: &Version) -> String {
        format!("{}/{}/-/{}-{}.tgz", self.base_url, name, name, version)
    }

    /// Download the archive for `name@version`, streaming chunks.
    ///
    /// `tarball_url` is the per-version URL published in the package
    /// metadata; when absent the default archive URL is derived from the
    /// name and version. `progress` receives a fraction in 0..=1 derived
    /// from Content-Length (a single 1.0 when the length is unknown). The
    /// `cancel` signal is checked between chunks; a cancelled download
    /// returns `OperationAborted` and is never retried.
    pub async fn download_archive(
        &self,
        name: &str,
        version: &Version,
        tarball_url: Option<&str>,
        progress: &(dyn Fn(f32) + Send + Sync),
        cancel: &watch::Receiver<bool>,
    ) -> RegistryResult<Vec<u8>> {
        let url = match tarball_url {
            Some(url) => url.to_string(),
            None => self.archive_url(name, version),
        };

        self.with_retry(|| async {
            let mut response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| SproutError::network(format!("download failed: {}", e), e))?;

            match response.status() {
                status if status.is_success() => {},
                reqwest::StatusCode::NOT_FOUND => {
                    return Err(SproutError::PackageNotFound {
                        name: format!("{}@{}", name, version),
                    })
                },
                status => {
                    return Err(SproutError::Network {
                        message: format!("download failed: registry returned status {}", status),
                        source: None,
                    })
                },
            }

            let total = response.content_length();
            let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);

            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| SproutError::network(format!("download failed: {}", e), e))?
            {
                if *cancel.borrow() {
                    return Err(SproutError::OperationAborted);
                }
                bytes.extend_from_slice(&chunk);
                if let Some(total) = total {
                    progress((bytes.len() as f32 / total as f32).min(1.0));
                }
            }
            progress(1.0);

            Ok(bytes)
        })
        .await
    }

    #[cfg(test)]
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    pub(crate) fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}
