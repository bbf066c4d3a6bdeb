//! httplog-core — line interpretation for the HTTP log exporter.
//!
//! Turns arbitrary container log lines into [`LogEvent`]s. Lines that
//! carry no recognisable HTTP status code produce nothing.
//!
//! ```text
//! LineParser::parse(line, workload, unit)
//!   ├── Combined   "<client> <id> <user> [ts] "METHOD /path PROTO" status size"
//!   ├── Common     "<client> - - [ts] "METHOD /path ..." status size"
//!   ├── KeyValue   ... "status": 500 ...
//!   └── BareStatus ... 4xx / 5xx token ...
//! ```

pub mod config;
pub mod parser;
pub mod types;

pub use config::{ConfigError, ExporterConfig, KubeConfig};
pub use parser::LineParser;
pub use types::*;
