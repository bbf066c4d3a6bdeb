//! Prometheus text exposition format.
//!
//! Owns the process registry and renders every registered family for
//! scraping by a Prometheus server or compatible agent.

use prometheus::{Registry, TextEncoder};

use crate::aggregator::MetricAggregator;
use crate::scrape::ScrapeMetrics;

/// `content-type` of [`ExporterMetrics::render`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// All exporter metrics behind one registry.
#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,
    aggregator: MetricAggregator,
    scrape: ScrapeMetrics,
}

impl ExporterMetrics {
    /// Build a fresh registry with every family registered.
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let registry = Registry::new();
        let aggregator = MetricAggregator::new(namespace, &registry)?;
        let scrape = ScrapeMetrics::new(namespace, &registry)?;
        Ok(Self {
            registry,
            aggregator,
            scrape,
        })
    }

    pub fn aggregator(&self) -> &MetricAggregator {
        &self.aggregator
    }

    pub fn scrape(&self) -> &ScrapeMetrics {
        &self.scrape
    }

    /// Render all families in Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
