//! httplog-metrics — counters derived from parsed log lines.
//!
//! # Architecture
//!
//! ```text
//! ExporterMetrics (one Registry per process)
//!   ├── MetricAggregator
//!   │   ├── http_requests_total{namespace,pod,container,status_code}
//!   │   └── http_errors_total{namespace,pod,container,status_code,error_class}
//!   ├── ScrapeMetrics
//!   │   ├── http_log_scraper_last_scrape_timestamp_seconds{namespace,pod,container}
//!   │   └── http_log_scraper_errors_total{namespace,pod,container,error_type}
//!   └── render() → text/plain for /metrics endpoint
//! ```
//!
//! All families are internally synchronized; handles are cheap to clone
//! and safe to update from concurrent scrape tasks.

pub mod aggregator;
pub mod exposition;
pub mod scrape;

pub use aggregator::MetricAggregator;
pub use exposition::{CONTENT_TYPE, ExporterMetrics};
pub use scrape::{SCRAPE_FAILED, ScrapeMetrics};
