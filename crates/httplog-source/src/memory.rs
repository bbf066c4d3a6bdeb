//! In-memory log source with fixed workloads.

use std::collections::HashMap;

use crate::error::SourceError;
use crate::source::{ScrapeTarget, SourceFuture, Workload, WorkloadLogSource};

/// Serves pre-loaded lines (or failures) per target.
#[derive(Debug, Default, Clone)]
pub struct StaticLogSource {
    workloads: Vec<Workload>,
    logs: HashMap<ScrapeTarget, Result<Vec<String>, String>>,
    list_error: Option<String>,
}

impl StaticLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `unit` of `workload` serving `lines`.
    pub fn with_lines<I, S>(mut self, workload: &str, unit: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_unit(workload, unit);
        let lines = lines.into_iter().map(Into::into).collect();
        self.logs.insert(ScrapeTarget::new(workload, unit), Ok(lines));
        self
    }

    /// Add `unit` of `workload` whose log stream always fails.
    pub fn with_failure(mut self, workload: &str, unit: &str, message: &str) -> Self {
        self.add_unit(workload, unit);
        self.logs
            .insert(ScrapeTarget::new(workload, unit), Err(message.to_string()));
        self
    }

    /// Make workload listing fail.
    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    fn add_unit(&mut self, workload: &str, unit: &str) {
        match self.workloads.iter_mut().find(|w| w.name == workload) {
            Some(existing) => {
                if !existing.units.iter().any(|u| u == unit) {
                    existing.units.push(unit.to_string());
                }
            }
            None => self.workloads.push(Workload::new(workload, [unit])),
        }
    }

    fn tail(&self, target: &ScrapeTarget, limit: u32) -> Result<Vec<String>, SourceError> {
        match self.logs.get(target) {
            Some(Ok(lines)) => {
                let skip = lines.len().saturating_sub(limit as usize);
                Ok(lines[skip..].to_vec())
            }
            Some(Err(message)) => Err(SourceError::Stream(message.clone())),
            None => Err(SourceError::NotFound(target.to_string())),
        }
    }
}

impl WorkloadLogSource for StaticLogSource {
    fn list_workloads(&self) -> SourceFuture<'_, Vec<Workload>> {
        let result = match &self.list_error {
            Some(message) => Err(SourceError::Stream(message.clone())),
            None => Ok(self.workloads.clone()),
        };
        Box::pin(async move { result })
    }

    fn tail_lines<'a>(&'a self, target: &'a ScrapeTarget, limit: u32) -> SourceFuture<'a, Vec<String>> {
        Box::pin(async move { self.tail(target, limit) })
    }
}
