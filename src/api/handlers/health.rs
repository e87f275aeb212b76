//! Health check handler

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::super::response::{ApiResponse, HealthData};
use super::super::state::AppState;
use crate::auth::AuthError;

/// Liveness plus a storage ping when running on PostgreSQL.
///
/// - Healthy: 200 OK + {success: true, data: {timestampMs, store}}
/// - Unhealthy: 503 + {success: false, code: "UNAVAILABLE"}; no internal details
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if let Some(db) = &state.pg_db {
        if let Err(e) = db.health_check().await {
            tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
            return AuthError::Unavailable.into_response();
        }
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthData {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            store: state.auth.store_name(),
        })),
    )
        .into_response()
}
