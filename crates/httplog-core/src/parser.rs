//! Cascading log line parser.
//!
//! Each line is offered to an ordered list of strategies, most specific
//! first. The first strategy that both matches and yields well-formed
//! numbers wins; a line no strategy accepts is dropped without error.

use regex::{Captures, Regex};

use crate::types::{LineFormat, LogEvent};

// Whitespace classes are ASCII only: `[\t\n\f\r ]`. A non-breaking or
// em space is an ordinary token character.

/// `127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /a.gif HTTP/1.0" 200 2326`
const COMBINED_PATTERN: &str = r#"^([^\t\n\f\r ]+) [^\t\n\f\r ]+ [^\t\n\f\r ]+ \[([^\]]+)\] "([^\t\n\f\r ]+) ([^\t\n\f\r ]+) [^\t\n\f\r ]+" ([0-9]+) ([0-9]+)"#;

/// Like combined, but ident/user must be `- -` and the request line may
/// carry anything after the path.
const COMMON_PATTERN: &str = r#"^([^\t\n\f\r ]+) - - \[([^\]]+)\] "([^\t\n\f\r ]+) ([^\t\n\f\r ]+) [^"]*" ([0-9]+) ([0-9]+)"#;

/// `"status": 500`, `status:404`, ... anywhere in the line. The key must
/// not be the tail of a compound name (`http_status`, `http.status`,
/// `upstream-status`).
const KEY_VALUE_PATTERN: &str = r#"(?:^|[^A-Za-z0-9_.\-])"?status"?[\t\n\f\r ]*:[\t\n\f\r ]*([0-9]+)"#;

/// Standalone 4xx/5xx token. 2xx/3xx are too ambiguous in free text.
const BARE_STATUS_PATTERN: &str = r"(?-u:\b)([45][0-9]{2})(?-u:\b)";

struct Strategy {
    format: LineFormat,
    pattern: Regex,
}

impl Strategy {
    fn new(format: LineFormat, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            format,
            pattern: Regex::new(pattern)?,
        })
    }

    fn extract(&self, line: &str, workload: &str, unit: &str) -> Option<LogEvent> {
        let caps = self.pattern.captures(line)?;
        match self.format {
            LineFormat::Combined | LineFormat::Common => access_log_event(&caps, workload, unit, self.format),
            LineFormat::KeyValue | LineFormat::BareStatus => {
                let status_code = caps[1].parse().ok()?;
                Some(LogEvent::status_only(status_code, workload, unit, self.format))
            }
        }
    }
}

/// Build an event from an access-log match. Capture layout:
/// 1 client, 2 timestamp, 3 method, 4 path, 5 status, 6 size.
fn access_log_event(
    caps: &Captures<'_>,
    workload: &str,
    unit: &str,
    format: LineFormat,
) -> Option<LogEvent> {
    let status_code = caps[5].parse().ok()?;
    let response_size = caps[6].parse().ok()?;
    Some(LogEvent {
        timestamp: caps[2].to_string(),
        method: caps[3].to_string(),
        path: caps[4].to_string(),
        status_code,
        response_size,
        source_workload: workload.to_string(),
        source_unit: unit.to_string(),
        format,
    })
}

/// Converts raw log lines into [`LogEvent`]s.
///
/// Immutable after construction; share one instance across tasks.
pub struct LineParser {
    strategies: Vec<Strategy>,
}

impl LineParser {
    /// Compile all strategies in priority order.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            strategies: vec![
                Strategy::new(LineFormat::Combined, COMBINED_PATTERN)?,
                Strategy::new(LineFormat::Common, COMMON_PATTERN)?,
                Strategy::new(LineFormat::KeyValue, KEY_VALUE_PATTERN)?,
                Strategy::new(LineFormat::BareStatus, BARE_STATUS_PATTERN)?,
            ],
        })
    }

    /// Parse one line produced by `unit` of `workload`.
    ///
    /// Returns `None` for empty lines and for lines without a usable
    /// status code.
    pub fn parse(&self, line: &str, workload: &str, unit: &str) -> Option<LogEvent> {
        if line.is_empty() {
            return None;
        }
        self.strategies
            .iter()
            .find_map(|strategy| strategy.extract(line, workload, unit))
    }
}

impl std::fmt::Debug for LineParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.format))
            .finish()
    }
}
