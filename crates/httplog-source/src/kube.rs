//! Kubernetes REST log source.
//!
//! Lists running pods in one namespace (optionally filtered by a label
//! selector) and reads container log tails via `pods/{name}/log`.
//! Talks to the API server either from inside the cluster using the
//! pod's service account, or through an explicit URL such as
//! `kubectl proxy`.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use httplog_core::ExporterConfig;

use crate::error::{SourceError, SourceResult};
use crate::source::{ScrapeTarget, SourceFuture, Workload, WorkloadLogSource};

/// Page size for pod listing.
const LIST_PAGE_SIZE: u32 = 500;

/// Longest API error body kept in [`SourceError::Api`].
const MAX_ERROR_BODY: usize = 512;

const POD_RUNNING: &str = "Running";

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    metadata: ListMeta,
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Default, Deserialize)]
struct ListMeta {
    #[serde(rename = "continue", default)]
    continue_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMeta,
    #[serde(default)]
    spec: Option<PodSpec>,
    #[serde(default)]
    status: Option<PodStatus>,
}

#[derive(Debug, Deserialize)]
struct PodMeta {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Container {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PodStatus {
    phase: Option<String>,
}

impl Pod {
    fn is_running(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            == Some(POD_RUNNING)
    }

    fn into_workload(self) -> Workload {
        let units = self
            .spec
            .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();
        Workload {
            name: self.metadata.name,
            units,
        }
    }
}

/// Reads pod logs from the Kubernetes API.
pub struct KubeLogSource {
    client: reqwest::Client,
    base_url: String,
    namespace: String,
    selector: Option<String>,
    token_file: Option<PathBuf>,
}

impl KubeLogSource {
    /// Build a source from the resolved exporter configuration.
    ///
    /// In-cluster mode requires `KUBERNETES_SERVICE_HOST` and reads the
    /// service account CA bundle eagerly.
    pub fn new(config: &ExporterConfig) -> SourceResult<Self> {
        let kube = &config.kube;
        let base_url = match &kube.api_server {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => in_cluster_url(
                std::env::var("KUBERNETES_SERVICE_HOST").ok(),
                std::env::var("KUBERNETES_SERVICE_PORT").ok(),
            )?,
        };

        let mut builder = reqwest::Client::builder()
            .timeout(kube.request_timeout())
            .user_agent(concat!("httplogd/", env!("CARGO_PKG_VERSION")));

        if let Some(ca_file) = kube.resolved_ca_file() {
            let pem = std::fs::read(&ca_file).map_err(|source| SourceError::Credentials {
                path: ca_file.display().to_string(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        debug!(%base_url, namespace = %config.namespace, "kubernetes log source configured");

        Ok(Self {
            client: builder.build()?,
            base_url,
            namespace: config.namespace.clone(),
            selector: config.selector().map(str::to_string),
            token_file: kube.resolved_token_file(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pods_url(&self) -> String {
        format!("{}/api/v1/namespaces/{}/pods", self.base_url, self.namespace)
    }

    /// Current bearer token. Re-read every call so rotated tokens apply.
    async fn bearer_token(&self) -> SourceResult<Option<String>> {
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        let token = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Credentials {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Some(token.trim().to_string()))
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> SourceResult<reqwest::Response> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SourceError::Api {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch_running_pods(&self) -> SourceResult<Vec<Workload>> {
        let url = self.pods_url();
        let mut workloads = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut query = vec![("limit", LIST_PAGE_SIZE.to_string())];
            if let Some(selector) = &self.selector {
                query.push(("labelSelector", selector.clone()));
            }
            if let Some(token) = continue_token.take() {
                query.push(("continue", token));
            }

            let bytes = self.get(&url, &query).await?.bytes().await?;
            let page: PodList = serde_json::from_slice(&bytes)?;
            workloads.extend(running_workloads(page.items));

            match page.metadata.continue_token {
                Some(token) if !token.is_empty() => continue_token = Some(token),
                _ => break,
            }
        }

        debug!(
            namespace = %self.namespace,
            pods = workloads.len(),
            "listed running pods"
        );
        Ok(workloads)
    }

    async fn fetch_tail(&self, target: &ScrapeTarget, limit: u32) -> SourceResult<Vec<String>> {
        let url = format!("{}/{}/log", self.pods_url(), target.workload);
        let query = [
            ("container", target.unit.clone()),
            ("tailLines", limit.to_string()),
        ];
        let body = self.get(&url, &query).await?.text().await?;
        Ok(tail(&body, limit))
    }
}

impl WorkloadLogSource for KubeLogSource {
    fn list_workloads(&self) -> SourceFuture<'_, Vec<Workload>> {
        Box::pin(self.fetch_running_pods())
    }

    fn tail_lines<'a>(&'a self, target: &'a ScrapeTarget, limit: u32) -> SourceFuture<'a, Vec<String>> {
        Box::pin(self.fetch_tail(target, limit))
    }
}

/// Keep only running pods, one workload per pod.
fn running_workloads(pods: Vec<Pod>) -> Vec<Workload> {
    pods.into_iter()
        .filter(Pod::is_running)
        .map(Pod::into_workload)
        .collect()
}

/// Last `limit` lines of a log body.
fn tail(body: &str, limit: u32) -> Vec<String> {
    let lines: Vec<&str> = body.lines().collect();
    let skip = lines.len().saturating_sub(limit as usize);
    lines[skip..].iter().map(|l| l.to_string()).collect()
}

/// API base URL from the in-cluster service environment.
fn in_cluster_url(host: Option<String>, port: Option<String>) -> SourceResult<String> {
    let host = host.filter(|h| !h.is_empty()).ok_or_else(|| {
        SourceError::Config(
            "KUBERNETES_SERVICE_HOST is not set; configure an explicit API server".to_string(),
        )
    })?;
    let port = port.filter(|p| !p.is_empty()).unwrap_or_else(|| "443".to_string());
    if host.contains(':') {
        Ok(format!("https://[{host}]:{port}"))
    } else {
        Ok(format!("https://{host}:{port}"))
    }
}
