use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use serde_json::json;

use crate::services::AppState;

pub mod attempts;
pub mod auth;
pub mod flashcards;
pub mod quizzes;

/// Liveness probe including a MongoDB ping. Reports degraded with 503 when
/// the database is unreachable so orchestrators can act on it.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let mongo_up = state
        .mongo
        .run_command(mongodb::bson::doc! { "ping": 1 })
        .await
        .is_ok();

    let status = if mongo_up { "ok" } else { "degraded" };
    let code = if mongo_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": status,
        "service": "lingodeck-api",
        "mongo": if mongo_up { "up" } else { "down" },
    });

    (code, axum::Json(body)).into_response()
}

/// Prometheus exposition endpoint
pub async fn metrics_handler() -> Response {
    match crate::metrics::render_metrics() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// HTTP Basic auth gate in front of /metrics. Credentials come from the
/// METRICS_AUTH environment variable as "user:password".
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());

    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    match provided {
        Some(credentials) if credentials == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
