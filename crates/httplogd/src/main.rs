//! httplogd — the httplog exporter daemon.
//!
//! Single binary that assembles the exporter:
//! - Kubernetes log source (pods list + container log tails)
//! - Line parser + metric aggregator
//! - Periodic scraper
//! - HTTP server for `/metrics` and `/health`
//!
//! # Usage
//!
//! ```text
//! httplogd --namespace shop --pod-selector app=web --scrape-interval 30
//! ```

mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, LogFormat};
use httplog_core::{ExporterConfig, LineParser};
use httplog_metrics::ExporterMetrics;
use httplog_scraper::{ScrapeSettings, Scraper};
use httplog_source::KubeLogSource;

const DEFAULT_LOG_FILTER: &str = "info,httplogd=debug,httplog=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.log_format)?;

    let config = cli.resolve()?;
    if cli.dry_run {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    run(config).await
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => DEFAULT_LOG_FILTER.parse()?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        namespace = %config.namespace,
        scrape_interval_secs = config.scrape_interval_secs,
        log_lines = config.log_lines,
        pod_selector = config.selector().unwrap_or(""),
        port = config.port,
        max_concurrent_scrapes = config.max_concurrent_scrapes,
        "httplog exporter starting"
    );

    // ── Initialize subsystems ──────────────────────────────────

    let parser = Arc::new(LineParser::new()?);
    let metrics = ExporterMetrics::new(&config.namespace)?;

    let source = KubeLogSource::new(&config)?;
    info!(api_server = source.base_url(), "kubernetes client configured");

    let scraper = Scraper::new(
        Arc::new(source),
        parser,
        metrics.clone(),
        ScrapeSettings::from_config(&config),
    );

    // ── Start background tasks ─────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scraper_handle = tokio::spawn(async move {
        scraper.run(shutdown_rx).await;
    });

    // ── Start HTTP server ──────────────────────────────────────

    let router = httplog_api::build_router(metrics);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!(%addr, "metrics server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = scraper_handle.await {
        error!(error = %e, "scraper task failed");
    }

    info!("httplog exporter stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
