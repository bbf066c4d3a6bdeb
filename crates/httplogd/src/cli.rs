//! Command-line flags and configuration resolution.
//!
//! Every flag also reads an environment variable, so the daemon can be
//! configured from a pod spec alone. Values stack in this order:
//!
//! ```text
//! defaults  <  --config file (TOML)  <  environment  <  flags
//! ```
//!
//! A variable that is set but blank (`value: ""` in a manifest) counts
//! as unset.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Command, CommandFactory, FromArgMatches, Parser, ValueEnum};
use httplog_core::ExporterConfig;

#[derive(Parser, Debug, Default)]
#[command(
    name = "httplogd",
    version,
    about = "Exports HTTP status metrics scraped from Kubernetes pod logs"
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Namespace whose pods are scraped.
    #[arg(long, env = "TARGET_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds between scrape cycles.
    #[arg(long, env = "SCRAPE_INTERVAL_SECONDS")]
    pub scrape_interval: Option<u64>,

    /// Lines read from the end of each container log per cycle.
    #[arg(long, env = "LOG_LINES_LIMIT")]
    pub log_lines: Option<u32>,

    /// Label selector restricting which pods are scraped.
    #[arg(long, env = "POD_SELECTOR")]
    pub pod_selector: Option<String>,

    /// Port for `/metrics` and `/health`.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Containers scraped in parallel.
    #[arg(long, env = "MAX_CONCURRENT_SCRAPES")]
    pub max_concurrent_scrapes: Option<usize>,

    /// Kubernetes API URL. Discovered in-cluster when unset.
    #[arg(long, env = "KUBE_API_SERVER")]
    pub kube_api_server: Option<String>,

    #[arg(long, env = "KUBE_TOKEN_FILE")]
    pub kube_token_file: Option<PathBuf>,

    #[arg(long, env = "KUBE_CA_FILE")]
    pub kube_ca_file: Option<PathBuf>,

    /// Print the resolved configuration and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Parse process arguments and environment, exiting on error.
    pub fn parse_args() -> Self {
        match Self::try_parse_with_env(std::env::args_os(), |name| std::env::var_os(name)) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        }
    }

    /// Parse `args`, consulting `lookup` to find environment variables
    /// that are set but blank. Those are not read.
    pub fn try_parse_with_env<I, T, F>(args: I, lookup: F) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: Fn(&OsStr) -> Option<OsString>,
    {
        let mut matches = command_without_blank_env(lookup).try_get_matches_from(args)?;
        Self::from_arg_matches_mut(&mut matches)
    }

    /// Load the config file (if any), apply overrides, and validate.
    pub fn resolve(&self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ExporterConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut ExporterConfig) {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(secs) = self.scrape_interval {
            config.scrape_interval_secs = secs;
        }
        if let Some(lines) = self.log_lines {
            config.log_lines = lines;
        }
        if let Some(selector) = &self.pod_selector {
            config.pod_selector = Some(selector.clone());
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(n) = self.max_concurrent_scrapes {
            config.max_concurrent_scrapes = n;
        }
        if let Some(url) = &self.kube_api_server {
            config.kube.api_server = Some(url.clone());
        }
        if let Some(path) = &self.kube_token_file {
            config.kube.token_file = Some(path.clone());
        }
        if let Some(path) = &self.kube_ca_file {
            config.kube.ca_file = Some(path.clone());
        }
    }
}

/// The clap command with env bindings dropped for blank variables.
fn command_without_blank_env<F>(lookup: F) -> Command
where
    F: Fn(&OsStr) -> Option<OsString>,
{
    Cli::command().mut_args(|arg| {
        let blank = arg
            .get_env()
            .and_then(&lookup)
            .is_some_and(|value| value.to_string_lossy().trim().is_empty());
        if blank { arg.env(None::<&'static str>) } else { arg }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httplog_core::ConfigError;
    use std::io::Write;

    #[test]
    fn no_overrides_keeps_defaults() {
        let config = Cli::default().resolve().unwrap();
        assert_eq!(config, ExporterConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "namespace = \"staging\"\nlog_lines = 500\nport = 9000\n\n[kube]\napi_server = \"https://k8s.local:6443\""
        )
        .unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            port: Some(9100),
            pod_selector: Some("app=web".into()),
            ..Default::default()
        };
        let config = cli.resolve().unwrap();

        assert_eq!(config.namespace, "staging");
        assert_eq!(config.log_lines, 500);
        assert_eq!(config.port, 9100);
        assert_eq!(config.selector(), Some("app=web"));
        assert_eq!(config.kube.api_server.as_deref(), Some("https://k8s.local:6443"));
        assert_eq!(config.scrape_interval_secs, 30);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let cli = Cli {
            scrape_interval: Some(0),
            ..Default::default()
        };
        let err = cli.resolve().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroScrapeInterval)
        );

        let cli = Cli {
            namespace: Some("  ".into()),
            ..Default::default()
        };
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/httplogd.toml")),
            ..Default::default()
        };
        let err = cli.resolve().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/httplogd.toml"));
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "httplogd",
            "--namespace",
            "prod",
            "--scrape-interval",
            "15",
            "--log-lines",
            "0",
            "--max-concurrent-scrapes",
            "2",
            "--log-format",
            "json",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.namespace.as_deref(), Some("prod"));
        assert_eq!(cli.scrape_interval, Some(15));
        assert_eq!(cli.log_lines, Some(0));
        assert_eq!(cli.max_concurrent_scrapes, Some(2));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.dry_run);
    }

    fn env_arg(command: &Command, id: &str) -> Option<OsString> {
        command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(OsStr::to_os_string)
    }

    #[test]
    fn blank_env_values_are_unset() {
        let blank = |name: &OsStr| match name.to_str() {
            Some("PORT") | Some("TARGET_NAMESPACE") => Some(OsString::from("")),
            Some("POD_SELECTOR") => Some(OsString::from("  ")),
            _ => None,
        };

        let command = command_without_blank_env(blank);
        assert_eq!(env_arg(&command, "port"), None);
        assert_eq!(env_arg(&command, "namespace"), None);
        assert_eq!(env_arg(&command, "pod_selector"), None);
        assert_eq!(
            env_arg(&command, "log_lines"),
            Some(OsString::from("LOG_LINES_LIMIT"))
        );
    }

    #[test]
    fn blank_env_falls_back_to_defaults() {
        let all_blank = |_: &OsStr| Some(OsString::new());
        let cli = Cli::try_parse_with_env(["httplogd"], all_blank).unwrap();

        assert_eq!(cli.port, None);
        assert_eq!(cli.namespace, None);
        assert_eq!(cli.scrape_interval, None);
        assert_eq!(cli.resolve().unwrap(), ExporterConfig::default());
    }

    #[test]
    fn flags_still_apply_when_env_is_blank() {
        let all_blank = |_: &OsStr| Some(OsString::new());
        let cli = Cli::try_parse_with_env(["httplogd", "--port", "9200"], all_blank).unwrap();
        assert_eq!(cli.resolve().unwrap().port, 9200);
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(Cli::try_parse_from(["httplogd", "--scrape-interval", "soon"]).is_err());
        assert!(Cli::try_parse_from(["httplogd", "--log-lines", "-5"]).is_err());
        assert!(Cli::try_parse_from(["httplogd", "--port", "70000"]).is_err());
    }
}
