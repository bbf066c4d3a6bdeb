//! Exporter configuration.
//!
//! Resolved once at startup (defaults, then an optional TOML file, then
//! environment and CLI overrides applied by the daemon) and shared
//! read-only afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_SCRAPE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LOG_LINES: u32 = 100;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONCURRENT_SCRAPES: usize = 4;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,
    #[error("scrape interval must be at least one second")]
    ZeroScrapeInterval,
    #[error("max concurrent scrapes must be at least 1")]
    ZeroConcurrency,
    #[error("kube request timeout must be at least one second")]
    ZeroRequestTimeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Namespace whose pods are scraped; also the `namespace` metric label.
    pub namespace: String,
    pub scrape_interval_secs: u64,
    /// Tail window read from each container per cycle.
    pub log_lines: u32,
    /// Kubernetes label selector, e.g. `app=web`.
    pub pod_selector: Option<String>,
    /// Port for the `/metrics` and `/health` endpoints.
    pub port: u16,
    pub max_concurrent_scrapes: usize,
    pub kube: KubeConfig,
}

/// How to reach the Kubernetes API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    /// API base URL. `None` means in-cluster discovery.
    pub api_server: Option<String>,
    /// Bearer token file. Re-read on every request.
    pub token_file: Option<PathBuf>,
    /// PEM bundle used to verify the API server.
    pub ca_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            scrape_interval_secs: DEFAULT_SCRAPE_INTERVAL_SECS,
            log_lines: DEFAULT_LOG_LINES,
            pod_selector: None,
            port: DEFAULT_PORT,
            max_concurrent_scrapes: DEFAULT_MAX_CONCURRENT_SCRAPES,
            kube: KubeConfig::default(),
        }
    }
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_server: None,
            token_file: None,
            ca_file: None,
            request_timeout_secs: 10,
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExporterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }

    /// Selector to send to the API, with blank values treated as absent.
    pub fn selector(&self) -> Option<&str> {
        self.pod_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.scrape_interval_secs == 0 {
            return Err(ConfigError::ZeroScrapeInterval);
        }
        if self.max_concurrent_scrapes == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.kube.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        Ok(())
    }
}

impl KubeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether the API server must be discovered from the pod environment.
    pub fn in_cluster(&self) -> bool {
        self.api_server.is_none()
    }

    /// Token file, falling back to the service account token in-cluster.
    pub fn resolved_token_file(&self) -> Option<PathBuf> {
        match (&self.token_file, self.in_cluster()) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(Path::new(SERVICE_ACCOUNT_DIR).join("token")),
            (None, false) => None,
        }
    }

    /// CA bundle, falling back to the service account CA in-cluster.
    pub fn resolved_ca_file(&self) -> Option<PathBuf> {
        match (&self.ca_file, self.in_cluster()) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(Path::new(SERVICE_ACCOUNT_DIR).join("ca.crt")),
            (None, false) => None,
        }
    }
}
