//! Read-only HTTP status surface.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use petcam_core::{OrchestratorStatus, SanitizedConfig};

use crate::metrics::{encode_metrics, STATUS_REQUESTS_TOTAL};

/// Shared state for status handlers
pub struct StatusState {
    config: SanitizedConfig,
    status: Arc<RwLock<OrchestratorStatus>>,
}

impl StatusState {
    pub fn new(config: SanitizedConfig, status: Arc<RwLock<OrchestratorStatus>>) -> Self {
        Self { config, status }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn create_router(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/config", get(config))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    STATUS_REQUESTS_TOTAL.with_label_values(&["health"]).inc();
    Json(HealthResponse { status: "ok" })
}

async fn status(State(state): State<Arc<StatusState>>) -> impl IntoResponse {
    STATUS_REQUESTS_TOTAL.with_label_values(&["status"]).inc();
    let snapshot = state.status.read().await.clone();
    Json(snapshot)
}

async fn config(State(state): State<Arc<StatusState>>) -> impl IntoResponse {
    STATUS_REQUESTS_TOTAL.with_label_values(&["config"]).inc();
    Json(state.config.clone())
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use petcam_core::{load_config_from_str, PhaseKind};
    use tower::ServiceExt;

    fn test_state() -> Arc<StatusState> {
        let config = load_config_from_str(
            r#"
[slack]
token = "xoxb-secret"
channel_id = "C0123456"

[queue]
url = "https://sqs.ap-northeast-1.amazonaws.com/123456789012/petcam"
"#,
        )
        .unwrap();

        let status = OrchestratorStatus {
            phase: PhaseKind::Cooldown,
            consecutive_failures: 2,
            max_consecutive_failures: 3,
            last_error: Some("queue unreachable".to_string()),
            ..Default::default()
        };

        Arc::new(StatusState::new(
            SanitizedConfig::from(&config),
            Arc::new(RwLock::new(status)),
        ))
    }

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let response = create_router(test_state())
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let (status, body) = get_json("/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "cooldown");
        assert_eq!(body["consecutive_failures"], 2);
        assert_eq!(body["max_consecutive_failures"], 3);
        assert_eq!(body["last_error"], "queue unreachable");
    }

    #[tokio::test]
    async fn test_config_redacts_token() {
        let (status, body) = get_json("/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slack"]["channel_id"], "C0123456");
        assert_eq!(body["slack"]["token_configured"], true);
        assert!(!body.to_string().contains("xoxb-secret"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = create_router(test_state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("petcam_"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = create_router(test_state())
            .oneshot(Request::get("/tickets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
