//! httplog-source — where log lines come from.
//!
//! A [`WorkloadLogSource`] lists the running workloads (pods) to scrape
//! and returns a bounded tail of recent lines for one of their units
//! (containers).
//!
//! # Implementations
//!
//! - [`KubeLogSource`]: Kubernetes REST API (`pods` list + `pods/log`).
//! - [`StaticLogSource`]: fixed in-memory workloads, for tests and local runs.

pub mod error;
pub mod kube;
pub mod memory;
pub mod source;

pub use error::{SourceError, SourceResult};
pub use kube::KubeLogSource;
pub use memory::StaticLogSource;
pub use source::{ScrapeTarget, SourceFuture, Workload, WorkloadLogSource};
