//! The workload log source seam.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::SourceResult;

/// Boxed future returned by [`WorkloadLogSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = SourceResult<T>> + Send + 'a>>;

/// A running workload and the units whose logs can be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Pod name.
    pub name: String,
    /// Container names, in pod spec order.
    pub units: Vec<String>,
}

impl Workload {
    pub fn new(name: impl Into<String>, units: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            units: units.into_iter().map(Into::into).collect(),
        }
    }

    /// One scrape target per unit.
    pub fn targets(&self) -> impl Iterator<Item = ScrapeTarget> + '_ {
        self.units.iter().map(|unit| ScrapeTarget {
            workload: self.name.clone(),
            unit: unit.clone(),
        })
    }
}

/// A single (workload, unit) log stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeTarget {
    pub workload: String,
    pub unit: String,
}

impl ScrapeTarget {
    pub fn new(workload: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workload, self.unit)
    }
}

/// Supplies workloads and bounded log tails. Injected for testability.
pub trait WorkloadLogSource: Send + Sync {
    /// Running workloads selected for scraping.
    fn list_workloads(&self) -> SourceFuture<'_, Vec<Workload>>;

    /// Up to `limit` most recent lines of `target`, oldest first.
    fn tail_lines<'a>(&'a self, target: &'a ScrapeTarget, limit: u32) -> SourceFuture<'a, Vec<String>>;
}
