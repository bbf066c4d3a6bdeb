//! Route handlers.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::error;

use crate::ApiState;

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, httplog_metrics::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use httplog_core::{LineFormat, LogEvent};
    use httplog_metrics::ExporterMetrics;

    fn test_state() -> ApiState {
        ApiState {
            metrics: ExporterMetrics::new("default").unwrap(),
        }
    }

    #[tokio::test]
    async fn health_says_ok() {
        let resp = health().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn metrics_content_type() {
        let resp = prometheus_metrics(State(test_state())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[tokio::test]
    async fn metrics_include_processed_events() {
        let state = test_state();
        state
            .metrics
            .aggregator()
            .process(&LogEvent::status_only(502, "web-0", "nginx", LineFormat::BareStatus));

        let resp = prometheus_metrics(State(state)).await.into_response();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains("status_code=\"502\""));
        assert!(text.contains("error_class=\"5xx\""));
    }
}
