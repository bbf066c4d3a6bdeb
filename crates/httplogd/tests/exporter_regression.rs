//! Exporter regression tests.
//!
//! Wires the scraper to an in-memory log source and checks what a
//! Prometheus server would see on `/metrics`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use httplog_api::build_router;
use httplog_core::LineParser;
use httplog_metrics::ExporterMetrics;
use httplog_scraper::{ScrapeSettings, Scraper};
use httplog_source::StaticLogSource;

fn settings() -> ScrapeSettings {
    ScrapeSettings {
        interval: Duration::from_secs(30),
        tail_lines: 100,
        max_concurrent: 4,
    }
}

fn exporter(source: StaticLogSource) -> (Scraper, ExporterMetrics) {
    let metrics = ExporterMetrics::new("shop").unwrap();
    let scraper = Scraper::new(
        Arc::new(source),
        Arc::new(LineParser::new().unwrap()),
        metrics.clone(),
        settings(),
    );
    (scraper, metrics)
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn sample<'a>(body: &'a str, name: &str, labels: &[&str]) -> Option<&'a str> {
    body.lines().find(|line| {
        line.starts_with(&format!("{name}{{")) && labels.iter().all(|l| line.contains(l))
    })
}

#[tokio::test]
async fn health_endpoint() {
    let (_, metrics) = exporter(StaticLogSource::new());
    let (status, _, body) = get(build_router(metrics), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn metrics_before_first_scrape() {
    let (_, metrics) = exporter(StaticLogSource::new());
    let (status, content_type, body) = get(build_router(metrics), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(sample(&body, "http_requests_total", &[]).is_none());
}

#[tokio::test]
async fn scraped_logs_are_exported() {
    let source = StaticLogSource::new()
        .with_lines(
            "web-7d9f",
            "nginx",
            [
                r#"10.0.0.1 - - [01/Jan/2024:12:00:00 +0000] "GET /cart HTTP/1.1" 200 512 "-" "curl/8.0""#,
                r#"10.0.0.2 - - [01/Jan/2024:12:00:01 +0000] "GET /missing HTTP/1.1" 404 0"#,
                r#"10.0.0.3 - - [01/Jan/2024:12:00:02 +0000] "POST /pay HTTP/1.1" 500 0"#,
                "worker started",
            ],
        )
        .with_lines("api-5c2a", "app", [r#"{"level":"error","status": 503}"#]);
    let (scraper, metrics) = exporter(source);

    let summary = scraper.scrape_once().await.unwrap();
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.events, 4);

    let (_, _, body) = get(build_router(metrics), "/metrics").await;

    let line = sample(
        &body,
        "http_requests_total",
        &["pod=\"web-7d9f\"", "container=\"nginx\"", "status_code=\"200\"", "namespace=\"shop\""],
    )
    .expect("200 series");
    assert!(line.ends_with(" 1"));

    assert!(sample(&body, "http_errors_total", &["status_code=\"404\"", "error_class=\"4xx\""]).is_some());
    assert!(sample(&body, "http_errors_total", &["status_code=\"500\"", "error_class=\"5xx\""]).is_some());
    assert!(
        sample(
            &body,
            "http_errors_total",
            &["pod=\"api-5c2a\"", "status_code=\"503\"", "error_class=\"5xx\""]
        )
        .is_some()
    );
    assert!(sample(&body, "http_errors_total", &["status_code=\"200\""]).is_none());
    assert!(sample(&body, "http_log_scraper_last_scrape_timestamp_seconds", &["pod=\"api-5c2a\""]).is_some());
}

#[tokio::test]
async fn failed_container_is_reported() {
    let source = StaticLogSource::new()
        .with_failure("web-7d9f", "nginx", "container is waiting to start")
        .with_lines("web-7d9f", "envoy", ["upstream 502"]);
    let (scraper, metrics) = exporter(source);

    let summary = scraper.scrape_once().await.unwrap();
    assert_eq!(summary.failed, 1);

    let (_, _, body) = get(build_router(metrics), "/metrics").await;
    let line = sample(
        &body,
        "http_log_scraper_errors_total",
        &["container=\"nginx\"", "error_type=\"scrape_failed\""],
    )
    .expect("scrape error series");
    assert!(line.ends_with(" 1"));
    assert!(sample(&body, "http_requests_total", &["container=\"envoy\"", "status_code=\"502\""]).is_some());
}

#[tokio::test]
async fn counters_accumulate_across_cycles() {
    let source = StaticLogSource::new().with_lines("web-7d9f", "nginx", ["GET /x 404"]);
    let (scraper, metrics) = exporter(source);

    for _ in 0..3 {
        scraper.scrape_once().await.unwrap();
    }

    let (_, _, body) = get(build_router(metrics), "/metrics").await;
    let line = sample(&body, "http_errors_total", &["status_code=\"404\""]).unwrap();
    assert!(line.ends_with(" 3"), "unexpected sample: {line}");
}
