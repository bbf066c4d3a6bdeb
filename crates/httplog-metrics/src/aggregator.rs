//! Metric aggregator — turns log events into request and error counters.

use prometheus::{IntCounterVec, Opts, Registry};

use httplog_core::LogEvent;

const REQUEST_LABELS: &[&str] = &["namespace", "pod", "container", "status_code"];
const ERROR_LABELS: &[&str] = &["namespace", "pod", "container", "status_code", "error_class"];

/// Cumulative request/error counters for one namespace.
///
/// Series are created on first use and only ever increase.
#[derive(Clone)]
pub struct MetricAggregator {
    /// Constant `namespace` label value.
    namespace: String,
    requests_total: IntCounterVec,
    errors_total: IntCounterVec,
}

impl MetricAggregator {
    /// Create the counter families and register them with `registry`.
    pub fn new(namespace: impl Into<String>, registry: &Registry) -> prometheus::Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests scraped from container logs",
            ),
            REQUEST_LABELS,
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Total number of HTTP errors scraped from container logs",
            ),
            ERROR_LABELS,
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(Self {
            namespace: namespace.into(),
            requests_total,
            errors_total,
        })
    }

    /// Record one event: always one request, plus one error for 4xx/5xx.
    pub fn process(&self, event: &LogEvent) {
        let status_code = event.status_code.to_string();
        let labels = [
            self.namespace.as_str(),
            event.source_workload.as_str(),
            event.source_unit.as_str(),
            status_code.as_str(),
        ];
        self.requests_total.with_label_values(&labels).inc();

        if let Some(class) = event.error_class() {
            let [namespace, pod, container, status] = labels;
            self.errors_total
                .with_label_values(&[namespace, pod, container, status, class.as_str()])
                .inc();
        }
    }

    pub fn requests_total(&self) -> &IntCounterVec {
        &self.requests_total
    }

    pub fn errors_total(&self) -> &IntCounterVec {
        &self.errors_total
    }
}
