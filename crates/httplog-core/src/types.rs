//! Shared types used across httplog crates.

/// Which parsing strategy produced a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    /// Combined-style access log with arbitrary ident/user tokens.
    Combined,
    /// Common-style access log with literal `- -` placeholders.
    Common,
    /// A `status: NNN` key-value pair anywhere in the line (JSON, logfmt-ish).
    KeyValue,
    /// A bare 4xx/5xx token anywhere in the line.
    BareStatus,
}

/// One HTTP request observed in a container log line.
///
/// Only `status_code` and the source identity are guaranteed. The other
/// fields are populated by the structured access-log formats and are
/// empty (or zero) otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Bracketed timestamp, verbatim.
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub status_code: u32,
    /// Zero when not extracted.
    pub response_size: u64,
    /// Workload (pod) that produced the line.
    pub source_workload: String,
    /// Sub-unit (container) that produced the line.
    pub source_unit: String,
    pub format: LineFormat,
}

impl LogEvent {
    /// Event carrying only a status code, as produced by the unstructured strategies.
    pub fn status_only(status_code: u32, workload: &str, unit: &str, format: LineFormat) -> Self {
        Self {
            timestamp: String::new(),
            method: String::new(),
            path: String::new(),
            status_code,
            response_size: 0,
            source_workload: workload.to_string(),
            source_unit: unit.to_string(),
            format,
        }
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        ErrorClass::from_status(self.status_code)
    }
}

/// Coarse error bucket derived from a status code's hundreds digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// 400–499
    ClientError,
    /// 500–599
    ServerError,
}

impl ErrorClass {
    /// Classify a status code. Anything outside `[400, 600)` is not an error.
    pub fn from_status(status_code: u32) -> Option<Self> {
        match status_code {
            400..=499 => Some(ErrorClass::ClientError),
            500..=599 => Some(ErrorClass::ServerError),
            _ => None,
        }
    }

    /// Label value used by the error counter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::ClientError => "4xx",
            ErrorClass::ServerError => "5xx",
        }
    }
}
