//! httplog-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition of every registered family |
//! | GET | `/health` | Liveness probe, always `OK` |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use httplog_metrics::ExporterMetrics;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub metrics: ExporterMetrics,
}

/// Build the exporter router.
pub fn build_router(metrics: ExporterMetrics) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/health", get(handlers::health))
        .with_state(ApiState { metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = build_router(ExporterMetrics::new("default").unwrap());
        let resp = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let app = build_router(ExporterMetrics::new("default").unwrap());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
