//! Engine configuration loaded from `sprout.toml`

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use sprout_core::error::SproutError;

use crate::EngineResult;

/// Configuration for one engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the package registry
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Directory under which every package occupies a sub-directory
    #[serde(default = "default_install_root")]
    pub install_root: Utf8PathBuf,

    /// Dependency name prefixes owned by the host package system
    #[serde(default)]
    pub host_prefixes: Vec<String>,

    /// Upper bound on concurrent package installs
    #[serde(default = "default_max_concurrent_installs")]
    pub max_concurrent_installs: usize,

    /// Metadata cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_registry_url() -> String {
    "https://registry.sprout.dev".to_string()
}

fn default_install_root() -> Utf8PathBuf {
    sprout_home().join("packages")
}

fn default_max_concurrent_installs() -> usize {
    4
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// `~/.sprout`, falling back to the current directory when no home exists
fn sprout_home() -> Utf8PathBuf {
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(".sprout"))
        .unwrap_or_else(|| Utf8PathBuf::from(".sprout"))
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            install_root: default_install_root(),
            host_prefixes: Vec::new(),
            max_concurrent_installs: default_max_concurrent_installs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl EngineConfig {
    /// Default config file location: `~/.sprout/sprout.toml`
    pub fn default_path() -> Utf8PathBuf {
        sprout_home().join("sprout.toml")
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| SproutError::ConfigValidation {
            field: "sprout.toml".to_string(),
            reason: format!("TOML parsing error: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path
    pub async fn load_from_file(path: &Utf8Path) -> EngineResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SproutError::io(format!("Failed to read {}", path), e))?;
        Self::parse(&content)
    }

    /// Load from the default path, or fall back to defaults if absent
    pub async fn load_or_default() -> EngineResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from_file(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Metadata cache TTL as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate field constraints
    pub fn validate(&self) -> EngineResult<()> {
        if self.registry_url.is_empty() {
            return Err(SproutError::ConfigValidation {
                field: "registry_url".to_string(),
                reason: "registry URL must not be empty".to_string(),
            });
        }
        if !self.registry_url.starts_with("http://") && !self.registry_url.starts_with("https://")
        {
            return Err(SproutError::ConfigValidation {
                field: "registry_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.registry_url),
            });
        }
        if self.max_concurrent_installs == 0 {
            return Err(SproutError::ConfigValidation {
                field: "max_concurrent_installs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent_installs, 4);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.install_root.as_str().ends_with("packages"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal() {
        let config = EngineConfig::parse(r#"registry_url = "https://registry.example.com""#)
            .unwrap();
        assert_eq!(config.registry_url, "https://registry.example.com");
        assert_eq!(config.max_concurrent_installs, 4);
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
registry_url = "http://localhost:8080"
install_root = "/tmp/sprout/packages"
host_prefixes = ["com.host."]
max_concurrent_installs = 2
cache_ttl_secs = 60
"#;
        let config = EngineConfig::parse(toml).unwrap();
        assert_eq!(config.install_root, Utf8PathBuf::from("/tmp/sprout/packages"));
        assert_eq!(config.host_prefixes, vec!["com.host.".to_string()]);
        assert_eq!(config.max_concurrent_installs, 2);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = EngineConfig::parse("max_concurrent_installs = 0");
        assert!(matches!(
            result,
            Err(SproutError::ConfigValidation { field, .. }) if field == "max_concurrent_installs"
        ));
    }

    #[test]
    fn test_non_http_registry_rejected() {
        let result = EngineConfig::parse(r#"registry_url = "ftp://registry.example.com""#);
        assert!(matches!(result, Err(SproutError::ConfigValidation { .. })));
    }
}
