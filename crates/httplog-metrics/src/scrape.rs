//! Scrape health metrics: when each container was last read, and how
//! often reading it failed.

use std::time::{SystemTime, UNIX_EPOCH};

use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};
use tracing::debug;

/// `error_type` label for a container whose logs could not be read.
pub const SCRAPE_FAILED: &str = "scrape_failed";

#[derive(Clone)]
pub struct ScrapeMetrics {
    namespace: String,
    last_scrape: GaugeVec,
    scrape_errors: IntCounterVec,
}

impl ScrapeMetrics {
    pub fn new(namespace: impl Into<String>, registry: &Registry) -> prometheus::Result<Self> {
        let last_scrape = GaugeVec::new(
            Opts::new(
                "http_log_scraper_last_scrape_timestamp_seconds",
                "Unix timestamp of the last successful log scrape",
            ),
            &["namespace", "pod", "container"],
        )?;
        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "http_log_scraper_errors_total",
                "Total number of errors encountered while scraping logs",
            ),
            &["namespace", "pod", "container", "error_type"],
        )?;

        registry.register(Box::new(last_scrape.clone()))?;
        registry.register(Box::new(scrape_errors.clone()))?;

        Ok(Self {
            namespace: namespace.into(),
            last_scrape,
            scrape_errors,
        })
    }

    /// Stamp the container as successfully scraped now.
    pub fn record_success(&self, pod: &str, container: &str) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        self.last_scrape
            .with_label_values(&[self.namespace.as_str(), pod, container])
            .set(now);
    }

    pub fn record_failure(&self, pod: &str, container: &str, error_type: &str) {
        self.scrape_errors
            .with_label_values(&[self.namespace.as_str(), pod, container, error_type])
            .inc();
        debug!(%pod, %container, %error_type, "scrape error recorded");
    }

    pub fn last_scrape(&self) -> &GaugeVec {
        &self.last_scrape
    }

    pub fn scrape_errors(&self) -> &IntCounterVec {
        &self.scrape_errors
    }
}
