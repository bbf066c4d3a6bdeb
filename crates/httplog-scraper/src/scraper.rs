//! Scraper — periodically tails container logs into the metric aggregator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use httplog_core::{ExporterConfig, LineParser};
use httplog_metrics::{ExporterMetrics, SCRAPE_FAILED};
use httplog_source::{ScrapeTarget, SourceResult, Workload, WorkloadLogSource};

/// Scheduling and windowing knobs for the scrape loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub interval: Duration,
    /// Lines read from each container per cycle.
    pub tail_lines: u32,
    /// Containers scraped at the same time.
    pub max_concurrent: usize,
}

impl ScrapeSettings {
    pub fn from_config(config: &ExporterConfig) -> Self {
        Self {
            interval: config.scrape_interval(),
            tail_lines: config.log_lines,
            max_concurrent: config.max_concurrent_scrapes,
        }
    }
}

/// Totals for one scrape cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Containers attempted.
    pub targets: usize,
    /// Containers whose logs could not be read.
    pub failed: usize,
    /// Lines read across all containers.
    pub lines: usize,
    /// Lines that produced an event.
    pub events: usize,
}

#[derive(Debug, Clone, Copy)]
struct TargetStats {
    lines: usize,
    events: usize,
}

/// Drives scrape cycles against a [`WorkloadLogSource`].
pub struct Scraper {
    source: Arc<dyn WorkloadLogSource>,
    parser: Arc<LineParser>,
    metrics: ExporterMetrics,
    settings: ScrapeSettings,
}

impl Scraper {
    pub fn new(
        source: Arc<dyn WorkloadLogSource>,
        parser: Arc<LineParser>,
        metrics: ExporterMetrics,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            source,
            parser,
            metrics,
            settings,
        }
    }

    /// Scrape every container of every listed workload once.
    ///
    /// Fails only if the workload list cannot be fetched; individual
    /// container failures are counted and logged.
    pub async fn scrape_once(&self) -> anyhow::Result<ScrapeSummary> {
        let workloads = self
            .source
            .list_workloads()
            .await
            .context("failed to list workloads")?;
        debug!(workloads = workloads.len(), "scrape cycle started");

        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        let mut summary = ScrapeSummary::default();

        for target in workloads.iter().flat_map(Workload::targets) {
            let permit = semaphore.clone().acquire_owned().await?;
            let source = self.source.clone();
            let parser = self.parser.clone();
            let metrics = self.metrics.clone();
            let limit = self.settings.tail_lines;
            summary.targets += 1;

            tasks.spawn(async move {
                let _permit = permit;
                let result = scrape_target(source.as_ref(), &parser, &metrics, &target, limit).await;
                match result {
                    Ok(stats) => {
                        metrics.scrape().record_success(&target.workload, &target.unit);
                        debug!(
                            pod = %target.workload,
                            container = %target.unit,
                            lines = stats.lines,
                            events = stats.events,
                            "processed log lines"
                        );
                        Some(stats)
                    }
                    Err(e) => {
                        warn!(
                            pod = %target.workload,
                            container = %target.unit,
                            error = %e,
                            "failed to scrape container logs"
                        );
                        metrics
                            .scrape()
                            .record_failure(&target.workload, &target.unit, SCRAPE_FAILED);
                        None
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(stats)) => {
                    summary.lines += stats.lines;
                    summary.events += stats.events;
                }
                Ok(None) => summary.failed += 1,
                Err(e) => {
                    error!(error = %e, "scrape task aborted");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Run the scrape loop until shutdown signal.
    ///
    /// Scrapes once immediately, then once per interval. A cycle that is
    /// in progress when shutdown arrives runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            tail_lines = self.settings.tail_lines,
            max_concurrent = self.settings.max_concurrent,
            "log scraper started"
        );

        self.run_cycle().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {
                    self.run_cycle().await;
                }
                _ = shutdown.changed() => {
                    info!("log scraper shutting down");
                    break;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let started = Instant::now();
        match self.scrape_once().await {
            Ok(summary) => info!(
                targets = summary.targets,
                failed = summary.failed,
                lines = summary.lines,
                events = summary.events,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scrape cycle complete"
            ),
            Err(e) => error!(error = %format!("{e:#}"), "scrape cycle failed"),
        }
    }
}

/// Tail one container and feed every parsed line to the aggregator.
async fn scrape_target(
    source: &dyn WorkloadLogSource,
    parser: &LineParser,
    metrics: &ExporterMetrics,
    target: &ScrapeTarget,
    limit: u32,
) -> SourceResult<TargetStats> {
    let lines = source.tail_lines(target, limit).await?;
    let aggregator = metrics.aggregator();

    let mut events = 0;
    for line in &lines {
        if let Some(event) = parser.parse(line, &target.workload, &target.unit) {
            aggregator.process(&event);
            events += 1;
        }
    }

    Ok(TargetStats {
        lines: lines.len(),
        events,
    })
}
