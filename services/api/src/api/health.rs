//! Health probes.
//!
//! `livez` answers as long as the process runs, `healthz` reports service
//! identity, and `readyz` verifies the database before a load balancer
//! routes traffic here.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

const SERVICE: &str = "marquee-api";

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: String,
    pub service: String,
    pub version: String,
    /// ISO 8601.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentHealth>,
}

impl HealthResponse {
    fn new(status: &str, components: Option<ComponentHealth>) -> Self {
        Self {
            status: status.to_string(),
            service: SERVICE.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
            components,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentHealth {
    pub database: ComponentStatus,
    pub job_queue: ComponentStatus,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentStatus {
    /// "ok" or "unavailable".
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn from_error(error: Option<String>) -> Self {
        Self {
            status: if error.is_none() { "ok" } else { "unavailable" }.to_string(),
            message: error,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

/// Identity probe. Answers 200 whenever the process is up; dependencies are
/// not consulted.
async fn healthz() -> impl IntoResponse {
    Json(HealthResponse::new("ok", None))
}

/// Readiness probe. Answers 503 until the database is reachable.
///
/// The job queue is a table in the same database, so its status mirrors the
/// pool's.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let db_error = state.db().health_check().await.err().map(|e| e.to_string());
    let ready = db_error.is_none();

    let components = ComponentHealth {
        database: ComponentStatus::from_error(db_error.clone()),
        job_queue: ComponentStatus::from_error(db_error),
    };

    let response = HealthResponse::new(if ready { "ok" } else { "degraded" }, Some(components));

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Minimal liveness probe.
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_reports_service_identity() {
        let response = healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.service, "marquee-api");
        assert_eq!(health.status, "ok");
        assert!(health.components.is_none());
    }

    #[tokio::test]
    async fn livez_is_a_bare_200() {
        let response = livez().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // readyz needs a live database; it is covered by the integration suite.
}
