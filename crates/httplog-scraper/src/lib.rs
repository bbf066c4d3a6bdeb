//! httplog-scraper — the polling loop around the parser and aggregator.
//!
//! # Architecture
//!
//! ```text
//! Scraper
//!   ├── scrape_once()
//!   │   ├── WorkloadLogSource::list_workloads()
//!   │   └── per (pod, container), at most `max_concurrent` at a time:
//!   │       ├── WorkloadLogSource::tail_lines()
//!   │       ├── LineParser::parse() per line
//!   │       └── MetricAggregator::process() per event
//!   └── run() → initial scrape, then one per interval until shutdown
//! ```
//!
//! Windows overlap between cycles and lines are not deduplicated, so
//! counts are best-effort.

pub mod scraper;

pub use scraper::{ScrapeSettings, ScrapeSummary, Scraper};
